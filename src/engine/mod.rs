//! Audio Engine Module
//!
//! The rendering core:
//! - Audio buffer management
//! - Tick/pitch conversion
//! - MIDI score input
//! - Event rendering and file export

pub mod buffer;
pub mod io;
pub mod render;
pub mod score;
pub mod timebase;

pub use buffer::{AudioBuffer, ChannelLayout};
pub use io::{export_audio, ExportFormat};
pub use render::{EventRenderer, PlacedNote, RenderOutcome, RenderStats, RenderedMix};
pub use score::{EventKind, Score, TimedEvent};
pub use timebase::TimeBase;
