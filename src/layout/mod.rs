//! Calendar layout engines
//!
//! Everything downstream of the domain analyses: turning tasks, overlaps,
//! and rankings into positioned bars on a calendar grid.
//!
//! | Module           | Responsibility                                      |
//! |------------------|-----------------------------------------------------|
//! | `config`         | Tunable thresholds for every engine                 |
//! | `geometry`       | `TaskBar` rectangles and collision math             |
//! | `scoring`        | Shared quality metric formulas                      |
//! | `stacking`       | Rule-driven stacking of overlap groups              |
//! | `vertical`       | Alignment, compression, and z-order within stacks   |
//! | `positioning`    | Grid placement and collision resolution             |
//! | `month_boundary` | Splitting bars that cross month edges               |
//! | `resolution`     | Overflow repair and conflict advice                 |
//! | `pipeline`       | Runs all stages in order                            |

pub mod config;
pub mod geometry;
pub mod month_boundary;
pub mod pipeline;
pub mod positioning;
pub mod resolution;
pub mod scoring;
pub mod stacking;
pub mod vertical;

pub use config::{GridConfig, LayoutConfig, OverlapConfig, PositioningConfig, ResolutionConfig, StackingConfig};
pub use geometry::TaskBar;
pub use month_boundary::{MonthBoundaryEngine, MonthLayout};
pub use pipeline::{LayoutPipeline, LayoutReport};
pub use positioning::{PositionedLayout, PositioningEngine};
pub use resolution::{ConflictResolutionEngine, LayoutStrategy, ResolutionReport};
pub use stacking::{SmartStackingEngine, StackingResult};
pub use vertical::{VerticalLayout, VerticalStackingEngine};
