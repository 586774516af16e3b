pub mod resolve;
pub mod urls;

pub use resolve::{candidates, resolve, resolve_candidate, srcset, Candidate, RenderTarget};
pub use urls::AssetUrls;
