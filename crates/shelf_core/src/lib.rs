//! Shelf core: pure product-harvesting domain (records, links, requests, results).
mod canonical;
mod fields;
mod link_set;
mod merge;
mod record;
mod request;
mod result;

pub use canonical::{canonicalize_url, resolve_link};
pub use fields::{parse_price, parse_score_line, ScoreLine, DEFAULT_SCORE_SEPARATOR, MAX_RATING};
pub use link_set::{InsertOutcome, LinkSet};
pub use merge::merge_with_seed;
pub use record::ProductRecord;
pub use request::{CollectionRequest, RequestError, RequestKind};
pub use result::{
    AbortReason, ArtifactRefs, CapSignal, CapStage, FailureClass, FailureNote, HarvestResult,
    OmittedLink, TerminationReason,
};
