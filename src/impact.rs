//! What-if delay estimation and the ranked corrective-action catalogue.

use crate::crew::Crew;
use crate::error::ModelError;
use crate::metrics::{DELAY_MINUTES, DISTANCE_KM, FUEL_LITRES, FUEL_PER_KM, TOTAL_COST};
use crate::model::weather::{weather_code, WEATHER_CODE, WEATHER_LABEL};
use crate::model::{DelayModel, ModelInput};
use crate::table::{Table, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub const TOLL_CHARGES: &str = "Toll_Charges_INR";

/// One trip described by the scalars a planner would enter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripInput {
    pub distance_km: f64,
    pub fuel_consumption_l: f64,
    pub toll_charges_inr: f64,
    #[serde(default = "default_weather")]
    pub weather: String,
    pub total_cost_inr: f64,
}

fn default_weather() -> String {
    "None".to_string()
}

impl TripInput {
    /// Single-row prediction frame. Fuel per km is 0 when distance is 0.
    pub fn to_frame(&self) -> Table {
        prepare_input(
            self.distance_km,
            self.fuel_consumption_l,
            self.toll_charges_inr,
            &self.weather,
            self.total_cost_inr,
        )
    }
}

pub fn prepare_input(distance_km: f64, fuel_l: f64, toll_inr: f64, weather: &str, total_cost: f64) -> Table {
    let fuel_per_km = if distance_km != 0.0 { fuel_l / distance_km } else { 0.0 };
    Table::from_columns(vec![
        (DISTANCE_KM, vec![Value::from(distance_km)]),
        (FUEL_LITRES, vec![Value::from(fuel_l)]),
        (TOLL_CHARGES, vec![Value::from(toll_inr)]),
        (WEATHER_CODE, vec![Value::Number(weather_code(weather))]),
        (FUEL_PER_KM, vec![Value::from(fuel_per_km)]),
        (TOTAL_COST, vec![Value::from(total_cost)]),
    ])
}

/// A hypothetical change to one feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    /// Replace the value outright, adding the column if needed.
    Set(f64),
    /// Multiply the existing value. No effect on absent columns or missing cells.
    Scale(f64),
}

/// Copy of `base` with every change applied.
pub fn apply_changes(base: &Table, changes: &[(&str, Change)]) -> Result<Table, ModelError> {
    let mut modified = base.clone();
    for (feature, change) in changes {
        match change {
            Change::Set(value) => {
                modified.set_column(*feature, vec![Value::from(*value); modified.num_rows()]);
            }
            Change::Scale(factor) => {
                if let Some(values) = modified.numeric(feature)? {
                    let scaled = values.into_iter().map(|v| v.map(|x| x * factor)).collect();
                    modified.set_numeric(*feature, scaled);
                }
            }
        }
    }
    Ok(modified)
}

fn first_prediction(model: &dyn DelayModel, frame: &Table) -> Result<f64, ModelError> {
    if frame.num_rows() == 0 {
        return Ok(0.0);
    }
    Ok(model
        .predict(ModelInput::Frame(frame))?
        .first()
        .copied()
        .unwrap_or(0.0))
}

/// Predicted delay minutes for the first row of `frame`.
pub fn predict_delay(model: &dyn DelayModel, frame: &Table) -> Result<f64, ModelError> {
    first_prediction(model, frame)
}

/// Minutes of delay saved by applying `changes`, never negative.
pub fn estimate_impact(
    model: &dyn DelayModel,
    base: &Table,
    changes: &[(&str, Change)],
) -> Result<f64, ModelError> {
    let modified = apply_changes(base, changes)?;
    let before = first_prediction(model, base)?;
    let after = first_prediction(model, &modified)?;
    Ok((before - after).max(0.0))
}

/// A ranked recommendation. Lower priority numbers are more urgent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrectiveAction {
    pub title: String,
    pub priority: u8,
    pub est_delay_reduction_min: f64,
    pub est_cost_change: String,
    pub details: Option<String>,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Group key (route, or order id without routes) with the highest mean delay.
pub fn highest_delay_group(trips: &Table) -> Result<Option<String>, ModelError> {
    let key_column = if trips.has_column("Route") { "Route" } else { "Order_ID" };
    let (Some(keys), Some(delays)) = (trips.column(key_column), trips.numeric(DELAY_MINUTES)?) else {
        return Ok(None);
    };

    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, (f64, usize)> = HashMap::new();
    for (key, delay) in keys.iter().zip(&delays) {
        let Some(key) = key.key() else { continue };
        let entry = totals.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            (0.0, 0)
        });
        if let Some(d) = delay {
            entry.0 += d;
            entry.1 += 1;
        }
    }

    let mut best: Option<(&String, f64)> = None;
    for key in &order {
        let (sum, count) = totals[key];
        if count == 0 {
            continue;
        }
        let mean = sum / count as f64;
        if best.map_or(true, |(_, m)| mean > m) {
            best = Some((key, mean));
        }
    }
    Ok(best.map(|(k, _)| k.clone()).or_else(|| order.first().cloned()))
}

fn base_weather_code(base: &Table) -> Result<i64, ModelError> {
    if let Some(codes) = base.numeric(WEATHER_CODE)? {
        return Ok(codes.first().copied().flatten().unwrap_or(0.0) as i64);
    }
    if let Some(Value::Text(label)) = base.get(0, WEATHER_LABEL) {
        return Ok(weather_code(label) as i64);
    }
    Ok(0)
}

/// Build the fixed three-action catalogue for `base`, optionally enriched by `crew`.
pub fn generate_corrective_actions(
    trips: &Table,
    model: &dyn DelayModel,
    base: &Table,
    crew: Option<&dyn Crew>,
) -> Result<Vec<CorrectiveAction>, ModelError> {
    let mut actions = Vec::with_capacity(3);

    if let Some(top_route) = highest_delay_group(trips)? {
        let reduction = estimate_impact(model, base, &[(DISTANCE_KM, Change::Scale(0.9))])?;
        actions.push(CorrectiveAction {
            title: format!(
                "Re-route deliveries currently on Route {} to shorter/less-congested alternatives",
                top_route
            ),
            priority: 1,
            est_delay_reduction_min: round1(reduction),
            est_cost_change: "±small".to_string(),
            details: Some(
                "Use historical congestion and distance data to pick alternate paths that reduce distance or avoid peak traffic. \
                 Prioritize high-delay routes for immediate re-routing."
                    .to_string(),
            ),
        });
    }

    let eased_weather = (base_weather_code(base)? - 1).max(0) as f64;
    let reduction = estimate_impact(model, base, &[(WEATHER_CODE, Change::Set(eased_weather))])?;
    actions.push(CorrectiveAction {
        title: "Shift departure times earlier for weather/peak-hour avoidance".to_string(),
        priority: 2,
        est_delay_reduction_min: round1(reduction),
        est_cost_change: "small".to_string(),
        details: None,
    });

    let reduction = estimate_impact(model, base, &[(FUEL_PER_KM, Change::Scale(0.85))])?;
    actions.push(CorrectiveAction {
        title: "Driver coaching and load optimization to reduce fuel per km".to_string(),
        priority: 3,
        est_delay_reduction_min: round1(reduction),
        est_cost_change: "reduces fuel costs".to_string(),
        details: Some(
            "Coach drivers on eco-driving, optimize loads, and perform vehicle maintenance to improve fuel efficiency."
                .to_string(),
        ),
    });

    if let Some(crew) = crew {
        enrich_with_crew(&mut actions, crew);
    }

    actions.sort_by_key(|a| a.priority);
    Ok(actions)
}

/// Prompt listing every action and its estimated reduction.
pub fn crew_prompt(actions: &[CorrectiveAction]) -> String {
    let listed: Vec<String> = actions
        .iter()
        .map(|a| format!("- {} (est_reduce={}m)", a.title, a.est_delay_reduction_min))
        .collect();
    format!(
        "You are an operations expert. Given these suggested actions: \n{}\n\
         Provide a concise 2-3 step execution plan for the top 2 actions and state which to do first.",
        listed.join("\n")
    )
}

fn enrich_with_crew(actions: &mut [CorrectiveAction], crew: &dyn Crew) {
    let prompt = crew_prompt(actions);
    match crew.run(&prompt) {
        Ok(plan) => {
            if let Some(first) = actions.first_mut() {
                let mut details = first.details.take().unwrap_or_default();
                details.push_str("\n\nCrew suggestion:\n");
                details.push_str(&plan);
                first.details = Some(details);
            }
        }
        Err(e) => debug!(crew = crew.name(), error = %e, "Crew enrichment skipped"),
    }
}
