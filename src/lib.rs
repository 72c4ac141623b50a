#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod buffers;
pub mod compositor;
pub mod controller;
pub mod diagnostics;
pub mod errors;
pub mod gamma;
pub mod peel;
pub mod sequencer;
pub mod settings;
pub mod shader;
pub mod slots;

pub use buffers::{BufferSize, PeelBufferSet, ResizeAction};
pub use controller::DepthPeeling;
pub use diagnostics::{CaptureBuffer, CaptureFrame, CaptureRole};
pub use errors::{Result, VeilError};
pub use peel::{DepthClass, DepthInterval};
pub use sequencer::{PassPlan, PassSequencer, SetId};
pub use settings::DepthPeelingSettings;
pub use shader::ShaderInjector;
