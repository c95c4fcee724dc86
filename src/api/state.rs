use std::path::PathBuf;

use crate::pages::PageContext;
use crate::upstream::UpstreamClient;

#[derive(Clone)]
pub struct AppState {
    pub upstream: UpstreamClient,
    pub pages: PageContext,
    pub static_dir: PathBuf,
}
