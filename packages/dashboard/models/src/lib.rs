#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter state, interaction, and chart view types for the farm dashboard.
//!
//! The dashboard links five charts through one shared [`FilterState`]. This
//! crate defines that state, the [`Interaction`]s that change it, and the
//! serializable view models each chart produces for the frontend.

pub mod buckets;
pub mod filters;
pub mod views;

use farm_map_farm_models::{FarmId, LocationType};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use buckets::{AreaBreakpoints, AreaBucket};
pub use filters::{
    AbsentPolicy, BubbleDrill, DrillUpdate, FilterError, FilterKey, FilterState, InclusionSet,
    PieDrill, ViewFilters,
};

/// The linked charts. Each chart is also the view that owns a slot of the
/// [`FilterState`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChartKind {
    /// Stacked bar chart of farms by users-per-farm and farm size.
    BarChart,
    /// Choropleth map with farm markers.
    GeoMap,
    /// Treemap of location area by type.
    Treemap,
    /// Circle-pack chart of certifications.
    BubbleChart,
    /// Sunburst of crop groups, crops, and varieties.
    PieChart,
}

impl ChartKind {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::BarChart,
            Self::GeoMap,
            Self::Treemap,
            Self::BubbleChart,
            Self::PieChart,
        ]
    }
}

/// How the bar chart scales its stacks.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BarMode {
    /// Each stack shows bucket shares summing to 100%.
    #[default]
    Percent,
    /// Each stack shows farm counts.
    Count,
}

/// Categories of interaction, used to look up which charts redraw.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    /// A bar chart bucket or user-count flag changed.
    BarFilter,
    /// The map selection changed.
    GeoSelection,
    /// The treemap location type filter changed.
    TreemapFilter,
    /// The bubble chart drill path changed.
    BubbleDrill,
    /// The pie chart drill path changed.
    PieDrill,
    /// The bar chart switched between percent and count.
    BarMode,
}

impl EventKind {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::BarFilter,
            Self::GeoSelection,
            Self::TreemapFilter,
            Self::BubbleDrill,
            Self::PieDrill,
            Self::BarMode,
        ]
    }
}

/// A user interaction reported by a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interaction {
    /// Clicked a farm-size legend entry.
    ToggleAreaBucket {
        /// The bucket clicked.
        bucket: AreaBucket,
    },
    /// Clicked a users-per-farm legend entry.
    ToggleUserCount {
        /// The users-per-farm value clicked.
        number_of_users: u32,
    },
    /// Clicked a country on the map.
    ClickCountry {
        /// Country name from the boundary file.
        country_name: String,
    },
    /// Clicked a farm marker on the map.
    ClickFarm {
        /// The farm clicked.
        farm_id: FarmId,
    },
    /// Double-clicked the map background.
    ResetMap,
    /// Clicked a treemap legend entry.
    ToggleLocationType {
        /// The location type clicked.
        location_type: LocationType,
    },
    /// Clicked a treemap cell.
    ClickTreemapFarm {
        /// The farm owning the cell.
        farm_id: FarmId,
    },
    /// Zoomed the bubble chart to a node.
    FocusBubble {
        /// Drill path of the focused node.
        focus: BubbleDrill,
    },
    /// Zoomed the sunburst to a node.
    FocusPie {
        /// Drill path of the focused node.
        focus: PieDrill,
    },
    /// Clicked the bar chart's percent/count switch.
    SetBarMode {
        /// The requested mode.
        mode: BarMode,
    },
}

impl Interaction {
    /// The event category of this interaction.
    #[must_use]
    pub const fn event_kind(&self) -> EventKind {
        match self {
            Self::ToggleAreaBucket { .. } | Self::ToggleUserCount { .. } => EventKind::BarFilter,
            Self::ClickCountry { .. }
            | Self::ClickFarm { .. }
            | Self::ResetMap
            | Self::ClickTreemapFarm { .. } => EventKind::GeoSelection,
            Self::ToggleLocationType { .. } => EventKind::TreemapFilter,
            Self::FocusBubble { .. } => EventKind::BubbleDrill,
            Self::FocusPie { .. } => EventKind::PieDrill,
            Self::SetBarMode { .. } => EventKind::BarMode,
        }
    }

    /// The chart the interaction originated from.
    #[must_use]
    pub const fn source(&self) -> ChartKind {
        match self {
            Self::ToggleAreaBucket { .. }
            | Self::ToggleUserCount { .. }
            | Self::SetBarMode { .. } => ChartKind::BarChart,
            Self::ClickCountry { .. } | Self::ClickFarm { .. } | Self::ResetMap => {
                ChartKind::GeoMap
            }
            Self::ToggleLocationType { .. } | Self::ClickTreemapFarm { .. } => ChartKind::Treemap,
            Self::FocusBubble { .. } => ChartKind::BubbleChart,
            Self::FocusPie { .. } => ChartKind::PieChart,
        }
    }
}
