//! Synchronization of a timed score with its engraved vector graphics.
//!
//! The pipeline runs strictly forward:
//!
//! 1. [`model::EventModel`] is built from the parsed [`dom::Score`].
//! 2. [`sync::tag`] gives every visible event a color marker.
//! 3. An external [`render::Engraver`] draws the score, painting the
//!    marked elements with their markers.
//! 4. [`sync::resolve`] reads the markers back from the
//!    [`scene::HostScene`] and binds graphic objects to events.
//! 5. [`timeline::Timeline`] turns every binding into a pure function of
//!    playback time.
//! 6. [`playback::PlaybackController`] drives the timeline from the host
//!    clock, writing object states frame by frame.
//!
//! [`sync::prepare`] runs steps 1-5 at once.
pub mod config;
pub mod dom;
pub mod error;
pub mod model;
pub mod notation;
pub mod playback;
pub mod primitives;
pub mod render;
pub mod scene;
pub mod sync;
pub mod timeline;

pub use config::SyncConfig;
pub use error::{
    BuildError, PlaybackStateError, RenderError, ResolutionWarning, SyncError,
    SyncResult, TaggingCapacityError,
};
pub use model::EventModel;
pub use playback::{FrameReport, PlaybackController, PlaybackState};
pub use sync::{prepare, PreparedScore};
pub use timeline::Timeline;
