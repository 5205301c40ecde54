//! The filter store.
//!
//! [`FilterState`] holds every chart's active selection. It is the single
//! source of truth for user intent; the filtered dataset is always derived
//! from it and never edited directly.
//!
//! Drill paths are mutually exclusive: while one of the bubble or pie drill
//! paths is set, attempts to change the other are blocked. Neither drill
//! setter clears the other path; that coordination belongs to the caller.

use std::collections::{BTreeMap, BTreeSet};

use farm_map_farm_models::{CropId, FarmId, LocationType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ChartKind;
use crate::buckets::{AreaBreakpoints, AreaBucket};

/// What an [`InclusionSet`] answers for a key it has no flag for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentPolicy {
    /// Keys without a flag are included.
    Include,
    /// Keys without a flag are excluded.
    Exclude,
}

/// A map of explicit include/exclude flags with a policy for absent keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionSet<K: Ord> {
    flags: BTreeMap<K, bool>,
    absent: AbsentPolicy,
}

impl<K: Ord + Clone> InclusionSet<K> {
    /// Creates a set where every given key is explicitly included.
    #[must_use]
    pub fn all_included(keys: impl IntoIterator<Item = K>, absent: AbsentPolicy) -> Self {
        Self {
            flags: keys.into_iter().map(|k| (k, true)).collect(),
            absent,
        }
    }

    /// The explicit flag for a key, if one was ever recorded.
    #[must_use]
    pub fn flag(&self, key: &K) -> Option<bool> {
        self.flags.get(key).copied()
    }

    /// Whether a key is included, applying the absent-key policy.
    #[must_use]
    pub fn is_included(&self, key: &K) -> bool {
        self.flag(key).unwrap_or(self.absent == AbsentPolicy::Include)
    }

    /// Records a flag. Returns `true` if inclusion changed.
    pub fn set(&mut self, key: K, included: bool) -> bool {
        let before = self.is_included(&key);
        self.flags.insert(key, included);
        before != included
    }

    /// Flips inclusion for a key and returns the new value.
    pub fn toggle(&mut self, key: K) -> bool {
        let included = !self.is_included(&key);
        self.flags.insert(key, included);
        included
    }

    /// Explicit flags in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, bool)> {
        self.flags.iter().map(|(k, &v)| (k, v))
    }
}

/// The bubble chart's drill path. A certifier is only ever selected
/// together with its certification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum BubbleDrill {
    /// Nothing selected.
    #[default]
    Root,
    /// A certification scheme.
    Certification {
        /// Certification name.
        certification: String,
    },
    /// A certifier within a certification scheme.
    Certifier {
        /// Certification name.
        certification: String,
        /// Certifier name.
        certifier: String,
    },
}

impl BubbleDrill {
    /// Selected certification, if any.
    #[must_use]
    pub fn certification(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Certification { certification } | Self::Certifier { certification, .. } => {
                Some(certification)
            }
        }
    }

    /// Selected certifier, if any.
    #[must_use]
    pub fn certifier(&self) -> Option<&str> {
        match self {
            Self::Certifier { certifier, .. } => Some(certifier),
            _ => None,
        }
    }

    /// Whether anything is selected.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Root)
    }
}

/// The pie chart's drill path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum PieDrill {
    /// Nothing selected.
    #[default]
    Root,
    /// A crop group.
    CropGroup {
        /// Crop group name.
        crop_group: String,
    },
    /// A crop within its group.
    Crop {
        /// Crop group name.
        crop_group: String,
        /// Crop id.
        crop_id: CropId,
    },
}

impl PieDrill {
    /// Selected crop group, if any.
    #[must_use]
    pub fn crop_group(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::CropGroup { crop_group } | Self::Crop { crop_group, .. } => Some(crop_group),
        }
    }

    /// Selected crop, if any.
    #[must_use]
    pub const fn crop_id(&self) -> Option<CropId> {
        match self {
            Self::Crop { crop_id, .. } => Some(*crop_id),
            _ => None,
        }
    }

    /// Whether anything is selected.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Root)
    }
}

/// Result of a drill path change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrillUpdate {
    /// The path changed.
    Applied,
    /// The requested path was already current.
    Unchanged,
    /// The other chart's drill path is active, so nothing changed.
    Blocked,
}

/// A key addressed through [`FilterState::set`] and [`FilterState::toggle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterKey {
    /// Bar chart farm-size bucket.
    AreaBucket(AreaBucket),
    /// Bar chart users-per-farm value.
    UserCount(u32),
    /// Map farm selection.
    Farm(FarmId),
    /// Treemap required location type.
    LocationType(LocationType),
}

impl FilterKey {
    /// The view that owns this key.
    #[must_use]
    pub const fn view(&self) -> ChartKind {
        match self {
            Self::AreaBucket(_) | Self::UserCount(_) => ChartKind::BarChart,
            Self::Farm(_) => ChartKind::GeoMap,
            Self::LocationType(_) => ChartKind::Treemap,
        }
    }
}

/// Errors from addressing the filter store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The key belongs to a different view.
    #[error("Filter key {key:?} does not belong to the {view} view")]
    KeyViewMismatch {
        /// View the caller addressed.
        view: ChartKind,
        /// Key the caller passed.
        key: FilterKey,
    },

    /// The view has no drill path.
    #[error("The {0} view has no drill path")]
    NoDrillPath(ChartKind),
}

/// Borrowed predicates of one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewFilters<'a> {
    /// Bar chart bucket and user-count flags.
    Bar {
        /// Farm-size bucket flags.
        area: &'a InclusionSet<AreaBucket>,
        /// Users-per-farm flags.
        user_count: &'a InclusionSet<u32>,
    },
    /// Map farm selection.
    Geo {
        /// Selected farm ids.
        selected: &'a BTreeSet<FarmId>,
    },
    /// Bubble chart drill path.
    Bubble(&'a BubbleDrill),
    /// Pie chart drill path.
    Pie(&'a PieDrill),
    /// Treemap required location types.
    Treemap {
        /// Location types a farm must all have.
        types: &'a BTreeSet<LocationType>,
    },
}

/// Every chart's active selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    area: InclusionSet<AreaBucket>,
    user_count: InclusionSet<u32>,
    selected_farms: BTreeSet<FarmId>,
    bubble: BubbleDrill,
    pie: PieDrill,
    location_types: BTreeSet<LocationType>,
}

impl FilterState {
    /// Creates the initial state: every bucket and observed user count
    /// included, nothing selected, no drill paths.
    ///
    /// Buckets outside the breakpoint list (unbucketed farms) are excluded;
    /// user counts never observed at load are included.
    #[must_use]
    pub fn new(breakpoints: &AreaBreakpoints, user_counts: impl IntoIterator<Item = u32>) -> Self {
        Self {
            area: InclusionSet::all_included(breakpoints.buckets(), AbsentPolicy::Exclude),
            user_count: InclusionSet::all_included(user_counts, AbsentPolicy::Include),
            selected_farms: BTreeSet::new(),
            bubble: BubbleDrill::Root,
            pie: PieDrill::Root,
            location_types: BTreeSet::new(),
        }
    }

    /// Returns the predicates of one view.
    #[must_use]
    pub const fn get(&self, view: ChartKind) -> ViewFilters<'_> {
        match view {
            ChartKind::BarChart => ViewFilters::Bar {
                area: &self.area,
                user_count: &self.user_count,
            },
            ChartKind::GeoMap => ViewFilters::Geo {
                selected: &self.selected_farms,
            },
            ChartKind::BubbleChart => ViewFilters::Bubble(&self.bubble),
            ChartKind::PieChart => ViewFilters::Pie(&self.pie),
            ChartKind::Treemap => ViewFilters::Treemap {
                types: &self.location_types,
            },
        }
    }

    /// Sets a key's value. For set-membership keys `true` inserts and
    /// `false` removes. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::KeyViewMismatch`] if the key belongs to a
    /// different view.
    pub fn set(
        &mut self,
        view: ChartKind,
        key: FilterKey,
        value: bool,
    ) -> Result<bool, FilterError> {
        check_view(view, &key)?;
        Ok(match key {
            FilterKey::AreaBucket(bucket) => self.area.set(bucket, value),
            FilterKey::UserCount(users) => self.user_count.set(users, value),
            FilterKey::Farm(farm_id) => set_membership(&mut self.selected_farms, farm_id, value),
            FilterKey::LocationType(location_type) => {
                set_membership(&mut self.location_types, location_type, value)
            }
        })
    }

    /// Flips a key and returns its new value.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::KeyViewMismatch`] if the key belongs to a
    /// different view.
    pub fn toggle(&mut self, view: ChartKind, key: FilterKey) -> Result<bool, FilterError> {
        check_view(view, &key)?;
        Ok(match key {
            FilterKey::AreaBucket(bucket) => self.area.toggle(bucket),
            FilterKey::UserCount(users) => self.user_count.toggle(users),
            FilterKey::Farm(farm_id) => {
                let present = self.selected_farms.contains(&farm_id);
                set_membership(&mut self.selected_farms, farm_id, !present);
                !present
            }
            FilterKey::LocationType(location_type) => {
                let present = self.location_types.contains(&location_type);
                set_membership(&mut self.location_types, location_type, !present);
                !present
            }
        })
    }

    /// Resets a drill path to its root. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::NoDrillPath`] for views without a drill path.
    pub fn clear_drill(&mut self, view: ChartKind) -> Result<bool, FilterError> {
        match view {
            ChartKind::BubbleChart => Ok(std::mem::take(&mut self.bubble).is_active()),
            ChartKind::PieChart => Ok(std::mem::take(&mut self.pie).is_active()),
            other => Err(FilterError::NoDrillPath(other)),
        }
    }

    /// Changes the bubble drill path unless a pie drill is active.
    pub fn set_bubble_drill(&mut self, drill: BubbleDrill) -> DrillUpdate {
        if self.pie.is_active() {
            DrillUpdate::Blocked
        } else if self.bubble == drill {
            DrillUpdate::Unchanged
        } else {
            self.bubble = drill;
            DrillUpdate::Applied
        }
    }

    /// Changes the pie drill path unless a bubble drill is active.
    pub fn set_pie_drill(&mut self, drill: PieDrill) -> DrillUpdate {
        if self.bubble.is_active() {
            DrillUpdate::Blocked
        } else if self.pie == drill {
            DrillUpdate::Unchanged
        } else {
            self.pie = drill;
            DrillUpdate::Applied
        }
    }

    /// Replaces the map selection. Returns whether it changed.
    pub fn replace_selection(&mut self, farm_ids: impl IntoIterator<Item = FarmId>) -> bool {
        let next: BTreeSet<FarmId> = farm_ids.into_iter().collect();
        if next == self.selected_farms {
            false
        } else {
            self.selected_farms = next;
            true
        }
    }

    /// Farm-size bucket flags.
    #[must_use]
    pub const fn area(&self) -> &InclusionSet<AreaBucket> {
        &self.area
    }

    /// Users-per-farm flags.
    #[must_use]
    pub const fn user_count(&self) -> &InclusionSet<u32> {
        &self.user_count
    }

    /// Farms selected on the map.
    #[must_use]
    pub const fn selected_farms(&self) -> &BTreeSet<FarmId> {
        &self.selected_farms
    }

    /// Bubble chart drill path.
    #[must_use]
    pub const fn bubble(&self) -> &BubbleDrill {
        &self.bubble
    }

    /// Pie chart drill path.
    #[must_use]
    pub const fn pie(&self) -> &PieDrill {
        &self.pie
    }

    /// Location types a farm must all have.
    #[must_use]
    pub const fn location_types(&self) -> &BTreeSet<LocationType> {
        &self.location_types
    }
}

fn check_view(view: ChartKind, key: &FilterKey) -> Result<(), FilterError> {
    if key.view() == view {
        Ok(())
    } else {
        Err(FilterError::KeyViewMismatch {
            view,
            key: key.clone(),
        })
    }
}

fn set_membership<T: Ord>(set: &mut BTreeSet<T>, value: T, present: bool) -> bool {
    if present {
        set.insert(value)
    } else {
        set.remove(&value)
    }
}
