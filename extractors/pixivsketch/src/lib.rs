pub mod live;

use dragnet_extractor_api::{AnyExtractor, NewExtractor};
use once_cell::sync::Lazy;

pub use live::PixivSketchRE;

pub static EXTRACTORS: Lazy<Vec<AnyExtractor>> =
    Lazy::new(|| vec![AnyExtractor::Recording(Box::new(PixivSketchRE::new()))]);
