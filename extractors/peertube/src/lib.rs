mod common;
mod instances;
pub mod playlist;
mod types;
pub mod video;

use dragnet_extractor_api::{AnyExtractor, NewExtractor};
use once_cell::sync::Lazy;

pub use common::{extract_embed_urls, PeertubeInstances};
pub use playlist::PeertubePlaylistLE;
pub use video::PeertubeRE;

pub static EXTRACTORS: Lazy<Vec<AnyExtractor>> = Lazy::new(|| {
    vec![
        AnyExtractor::List(Box::new(PeertubePlaylistLE::new())),
        AnyExtractor::Recording(Box::new(PeertubeRE::new())),
    ]
});
