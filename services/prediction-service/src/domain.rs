//! Wire-level input types shared by both prediction endpoints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One line of a packing list. `quantity` absent, `null` or `0` counts as a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub quantity: Option<u32>,
    /// Accepted on the wire, not used by any feature set.
    #[serde(default)]
    pub weight: Option<f64>,
}

impl Item {
    pub fn new(length: f64, width: f64, height: f64, quantity: u32) -> Self {
        Self { length, width, height, quantity: Some(quantity), weight: None }
    }

    pub fn volume(&self) -> f64 { self.length * self.width * self.height }

    /// Physical units this line expands to.
    pub fn units(&self) -> u64 {
        match self.quantity {
            None | Some(0) => 1,
            Some(q) => u64::from(q),
        }
    }

    pub fn dimensions(&self) -> [f64; 3] { [self.length, self.width, self.height] }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Container {
    pub fn new(length: f64, width: f64, height: f64) -> Self { Self { length, width, height } }

    pub fn volume(&self) -> f64 { self.length * self.width * self.height }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub items: Vec<Item>,
    pub container: Container,
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be a finite number >= 0, got {value}")]
    Dimension { field: String, value: f64 },
    #[error("{field} is too large: volume overflows")]
    Volume { field: String },
}

fn check_volume(field: impl FnOnce() -> String, volume: f64) -> Result<(), ValidationError> {
    if volume.is_finite() { Ok(()) } else { Err(ValidationError::Volume { field: field() }) }
}

fn check(field: impl FnOnce() -> String, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 { Ok(()) } else { Err(ValidationError::Dimension { field: field(), value }) }
}

impl PredictionRequest {
    /// Zero dimensions pass; they degrade to default features downstream.
    /// Volumes, per line and in total, must stay finite.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut total_volume = 0.0;
        for (idx, item) in self.items.iter().enumerate() {
            check(|| format!("items[{idx}].length"), item.length)?;
            check(|| format!("items[{idx}].width"), item.width)?;
            check(|| format!("items[{idx}].height"), item.height)?;
            if let Some(w) = item.weight { check(|| format!("items[{idx}].weight"), w)?; }
            let line_volume = item.volume() * item.units() as f64;
            check_volume(|| format!("items[{idx}]"), line_volume)?;
            total_volume += line_volume;
        }
        check_volume(|| "items".into(), total_volume)?;
        check(|| "container.length".into(), self.container.length)?;
        check(|| "container.width".into(), self.container.width)?;
        check(|| "container.height".into(), self.container.height)?;
        check_volume(|| "container".into(), self.container.volume())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_defaults_to_one() {
        let item: Item = serde_json::from_str(r#"{"length":1,"width":2,"height":3}"#).unwrap();
        assert_eq!(item.units(), 1);
        let item: Item = serde_json::from_str(r#"{"length":1,"width":2,"height":3,"quantity":null}"#).unwrap();
        assert_eq!(item.units(), 1);
        let item: Item = serde_json::from_str(r#"{"length":1,"width":2,"height":3,"quantity":0}"#).unwrap();
        assert_eq!(item.units(), 1);
        assert_eq!(Item::new(1.0, 1.0, 1.0, 4).units(), 4);
    }

    #[test]
    fn negative_quantity_is_rejected_by_schema() {
        let res: Result<Item, _> = serde_json::from_str(r#"{"length":1,"width":2,"height":3,"quantity":-2}"#);
        assert!(res.is_err());
    }

    #[test]
    fn validate_flags_negative_dimension() {
        let req = PredictionRequest {
            items: vec![Item::new(1.0, 1.0, 1.0, 1), Item::new(1.0, -2.0, 1.0, 1)],
            container: Container::new(10.0, 10.0, 10.0),
        };
        assert_eq!(req.validate(), Err(ValidationError::Dimension { field: "items[1].width".into(), value: -2.0 }));
    }

    #[test]
    fn validate_flags_overflowing_volumes() {
        let huge = PredictionRequest {
            items: vec![Item::new(1e120, 1e120, 1e120, 2)],
            container: Container::new(1.0, 1.0, 1.0),
        };
        assert_eq!(huge.validate(), Err(ValidationError::Volume { field: "items[0]".into() }));

        // each line fits, the sum does not
        let summed = PredictionRequest {
            items: vec![Item::new(1e100, 1e100, 1e108, 1), Item::new(1e100, 1e100, 1e108, 1)],
            container: Container::new(1.0, 1.0, 1.0),
        };
        assert_eq!(summed.validate(), Err(ValidationError::Volume { field: "items".into() }));

        let container = PredictionRequest { items: vec![], container: Container::new(1e200, 1e200, 1.0) };
        assert_eq!(container.validate(), Err(ValidationError::Volume { field: "container".into() }));
    }

    #[test]
    fn validate_accepts_zero_sized_container() {
        let req = PredictionRequest { items: vec![], container: Container::new(0.0, 10.0, 10.0) };
        assert!(req.validate().is_ok());
    }
}
