// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod columns;
pub mod dates;
pub mod filter;
pub mod forms;
pub mod grid;
pub mod grouping;
pub mod ids;
pub mod model;
pub mod navigation;
pub mod resize;
pub mod state;
pub mod timeline;

pub use columns::*;
pub use filter::*;
pub use forms::*;
pub use grid::*;
pub use grouping::*;
pub use ids::*;
pub use model::*;
pub use navigation::*;
pub use resize::*;
pub use state::*;
pub use timeline::*;
