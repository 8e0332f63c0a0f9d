mod app;
pub mod color;
pub mod drawing;
mod error;
mod gpu;
pub mod raster;
pub mod session;
pub mod settings;
pub mod store;
pub mod surface;

// Re-export the main public interface
pub use app::run;
pub use color::{Color, Rgb, hex_to_rgb};
pub use drawing::{Drawing, Segment};
pub use error::StoreError;
pub use raster::{BresenhamLine, Point, line_points, stroke_segments};
pub use session::{Session, Stroke};
pub use settings::Settings;
pub use surface::{RasterSurface, Surface};
