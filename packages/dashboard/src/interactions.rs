//! Translates chart interactions into filter mutations.

use farm_map_dashboard_models::{ChartKind, DrillUpdate, FilterError, FilterKey, Interaction};
use farm_map_farm_models::FarmId;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// What applying an interaction did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applied {
    /// Whether any filter or view setting changed.
    pub changed: bool,
    /// Outcome of a drill path request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drill: Option<DrillUpdate>,
}

impl Applied {
    const fn changed(changed: bool) -> Self {
        Self {
            changed,
            drill: None,
        }
    }

    const fn drill(update: DrillUpdate) -> Self {
        Self {
            changed: matches!(update, DrillUpdate::Applied),
            drill: Some(update),
        }
    }
}

/// Applies an interaction's mutation without recomputing or redrawing.
///
/// # Errors
///
/// Returns [`FilterError`] if a filter key is addressed to the wrong view.
pub fn apply(interaction: &Interaction, state: &mut AppState) -> Result<Applied, FilterError> {
    Ok(match interaction {
        Interaction::ToggleAreaBucket { bucket } => {
            state
                .filters_mut()
                .toggle(ChartKind::BarChart, FilterKey::AreaBucket(*bucket))?;
            Applied::changed(true)
        }
        Interaction::ToggleUserCount { number_of_users } => {
            state
                .filters_mut()
                .toggle(ChartKind::BarChart, FilterKey::UserCount(*number_of_users))?;
            Applied::changed(true)
        }
        Interaction::ClickCountry { country_name } => {
            Applied::changed(click_country(state, country_name)?)
        }
        Interaction::ClickFarm { farm_id } => Applied::changed(click_farm(state, farm_id)?),
        Interaction::ResetMap => {
            Applied::changed(state.filters_mut().replace_selection(std::iter::empty()))
        }
        Interaction::ToggleLocationType { location_type } => {
            state
                .filters_mut()
                .toggle(ChartKind::Treemap, FilterKey::LocationType(*location_type))?;
            Applied::changed(true)
        }
        Interaction::ClickTreemapFarm { farm_id } => {
            let filters = state.filters_mut();
            let changed = if filters.selected_farms().len() == 1 {
                filters.replace_selection(std::iter::empty())
            } else {
                filters.replace_selection([farm_id.clone()])
            };
            Applied::changed(changed)
        }
        Interaction::FocusBubble { focus } => {
            Applied::drill(state.filters_mut().set_bubble_drill(focus.clone()))
        }
        Interaction::FocusPie { focus } => {
            Applied::drill(state.filters_mut().set_pie_drill(focus.clone()))
        }
        Interaction::SetBarMode { mode } => Applied::changed(state.set_bar_mode(*mode)),
    })
}

/// Selects every visible, unselected farm of the country; if there are
/// none, deselects the country's visible farms instead.
fn click_country(state: &mut AppState, country_name: &str) -> Result<bool, FilterError> {
    let clickable: Vec<FarmId> = state
        .dataset()
        .farm_ids_in_country(country_name)
        .iter()
        .filter(|farm_id| state.filtered().contains(farm_id))
        .cloned()
        .collect();

    if clickable.is_empty() {
        log::debug!("No visible farms in {country_name}");
        return Ok(false);
    }

    let (selected, unselected): (Vec<FarmId>, Vec<FarmId>) = clickable
        .into_iter()
        .partition(|farm_id| state.filters().selected_farms().contains(farm_id));

    let (farm_ids, select) = if unselected.is_empty() {
        (selected, false)
    } else {
        (unselected, true)
    };

    let filters = state.filters_mut();
    let mut changed = false;
    for farm_id in farm_ids {
        changed |= filters.set(ChartKind::GeoMap, FilterKey::Farm(farm_id), select)?;
    }
    Ok(changed)
}

/// Toggles a farm's selection. Hidden farms are not clickable.
fn click_farm(state: &mut AppState, farm_id: &FarmId) -> Result<bool, FilterError> {
    if !state.filtered().contains(farm_id) {
        log::debug!("Ignoring click on hidden farm {farm_id}");
        return Ok(false);
    }
    state
        .filters_mut()
        .toggle(ChartKind::GeoMap, FilterKey::Farm(farm_id.clone()))?;
    Ok(true)
}
