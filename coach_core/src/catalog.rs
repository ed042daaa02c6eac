//! Exercise catalog: built-in defaults, file loading and validation.

use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<ExerciseCatalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static ExerciseCatalog {
    &DEFAULT_CATALOG
}

/// On-disk catalog layout (TOML `[[exercises]]` tables or a JSON object)
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    exercises: Vec<ExerciseRecord>,
}

#[allow(clippy::too_many_arguments)]
fn exercise(
    id: &str,
    name: &str,
    primary: &str,
    secondary: &[&str],
    pattern: MovementPattern,
    equipment: &[&str],
    loadable: bool,
    seconds_per_rep: f64,
    tags: &[&str],
) -> ExerciseRecord {
    ExerciseRecord {
        id: id.into(),
        name: name.into(),
        primary_muscle: primary.into(),
        secondary_muscles: secondary.iter().map(|s| s.to_string()).collect(),
        movement_pattern: pattern,
        equipment: equipment.iter().map(|s| s.to_string()).collect(),
        loadable,
        seconds_per_rep,
        tags: tags.iter().map(|s| s.to_string()).collect(),
    }
}

/// Builds the default catalog of built-in exercises
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference.
pub fn build_default_catalog() -> ExerciseCatalog {
    use MovementPattern::*;

    let records = vec![
        // Bodyweight
        exercise("air_squat", "Air Squat", "quads", &["glutes", "hamstrings"], Squat, &[], false, 2.0, &["warmup", "activation", "conditioning"]),
        exercise("push_up", "Push-up", "chest", &["triceps", "shoulders"], Push, &[], false, 2.0, &["strength", "bodyweight"]),
        exercise("burpee", "Burpee", "full_body", &["chest", "quads"], Jump, &[], false, 3.0, &["cardio", "conditioning", "explosive"]),
        exercise("jumping_jack", "Jumping Jack", "calves", &["shoulders"], Locomotion, &[], false, 1.0, &["warmup", "cardio"]),
        exercise("mountain_climber", "Mountain Climber", "abs", &["shoulders", "hip_flexors"], Core, &[], false, 1.0, &["cardio", "conditioning", "core"]),
        exercise("plank_shoulder_tap", "Plank Shoulder Tap", "abs", &["shoulders"], Core, &[], false, 1.5, &["core", "stability"]),
        exercise("walking_lunge", "Walking Lunge", "quads", &["glutes"], Lunge, &[], false, 2.5, &["strength", "unilateral"]),
        exercise("glute_bridge", "Glute Bridge", "glutes", &["hamstrings"], Hinge, &[], false, 2.0, &["activation", "glutes"]),
        exercise("russian_twist", "Russian Twist", "obliques", &["abs"], Rotation, &[], false, 1.5, &["core"]),
        exercise("hip_cars", "Hip CARs", "hips", &[], Mobility, &[], false, 8.0, &["mobility", "cooldown"]),
        exercise("worlds_greatest_stretch", "World's Greatest Stretch", "hips", &["hamstrings", "thoracic"], Mobility, &[], false, 10.0, &["mobility", "activation"]),
        // Bars, boxes, bands
        exercise("pull_up", "Pull-up", "lats", &["biceps"], Pull, &["pullup_bar"], false, 3.0, &["strength"]),
        exercise("band_pull_apart", "Band Pull-apart", "rear_delts", &["upper_back"], Pull, &["band"], false, 2.0, &["activation", "mobility"]),
        exercise("box_jump", "Box Jump", "quads", &["glutes", "calves"], Jump, &["box"], false, 3.0, &["explosive", "conditioning"]),
        // Barbell
        exercise("back_squat", "Back Squat", "quads", &["glutes", "lower_back"], Squat, &["barbell", "rack"], true, 3.5, &["strength"]),
        exercise("deadlift", "Deadlift", "hamstrings", &["glutes", "lower_back"], Hinge, &["barbell"], true, 4.0, &["strength"]),
        exercise("bench_press", "Bench Press", "chest", &["triceps", "shoulders"], Push, &["barbell", "bench"], true, 3.0, &["strength", "hypertrophy"]),
        exercise("barbell_row", "Barbell Row", "upper_back", &["lats", "biceps"], Pull, &["barbell"], true, 3.0, &["strength", "hypertrophy"]),
        exercise("overhead_press", "Overhead Press", "shoulders", &["triceps"], Push, &["barbell"], true, 3.0, &["strength"]),
        exercise("hip_thrust", "Barbell Hip Thrust", "glutes", &["hamstrings"], Hinge, &["barbell", "bench"], true, 3.0, &["strength", "glutes"]),
        // Kettlebell and conditioning equipment
        exercise("kettlebell_swing", "Kettlebell Swing", "glutes", &["hamstrings", "lower_back"], Hinge, &["kettlebell"], true, 1.5, &["conditioning", "cardio"]),
        exercise("goblet_squat", "Goblet Squat", "quads", &["glutes", "abs"], Squat, &["kettlebell"], true, 3.0, &["strength", "technique"]),
        exercise("farmers_carry", "Farmer's Carry", "forearms", &["traps", "abs"], Carry, &["kettlebell"], true, 10.0, &["conditioning", "hyrox"]),
        exercise("wall_ball", "Wall Ball", "quads", &["shoulders", "glutes"], Squat, &["medicine_ball"], true, 3.0, &["conditioning", "hyrox"]),
        exercise("row_erg", "Rowing Erg (calories)", "lats", &["quads", "upper_back"], Pull, &["rower"], false, 2.0, &["cardio", "hyrox", "conditioning"]),
        exercise("sled_push", "Sled Push", "quads", &["calves", "glutes"], Locomotion, &["sled"], true, 4.0, &["hyrox", "conditioning"]),
    ];

    let exercises = records
        .into_iter()
        .map(|r| (r.id.clone(), r))
        .collect::<HashMap<_, _>>();

    ExerciseCatalog { exercises }
}

impl ExerciseCatalog {
    /// Build a catalog from records, rejecting duplicate ids
    pub fn from_records(records: Vec<ExerciseRecord>) -> Result<Self> {
        let mut exercises = HashMap::with_capacity(records.len());
        for record in records {
            if exercises.contains_key(&record.id) {
                return Err(Error::CatalogValidation(format!(
                    "Duplicate exercise id '{}'",
                    record.id
                )));
            }
            exercises.insert(record.id.clone(), record);
        }
        Ok(Self { exercises })
    }

    /// Load a catalog from a `.toml` or `.json` file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let file: CatalogFile = if is_json {
            serde_json::from_str(&contents)?
        } else {
            toml::from_str(&contents)?
        };

        let catalog = Self::from_records(file.exercises)?;
        tracing::info!("Loaded {} exercises from {:?}", catalog.len(), path);
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&ExerciseRecord> {
        self.exercises.get(id)
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// All records ordered by id
    pub fn sorted(&self) -> Vec<&ExerciseRecord> {
        let mut records: Vec<_> = self.exercises.values().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, record) in &self.exercises {
            if id.is_empty() || record.id.is_empty() {
                errors.push("Exercise has empty ID".to_string());
            }
            if id != &record.id {
                errors.push(format!(
                    "Exercise key '{}' doesn't match exercise.id '{}'",
                    id, record.id
                ));
            }
            if record.name.trim().is_empty() {
                errors.push(format!("Exercise '{}' has empty name", id));
            }
            if record.primary_muscle.trim().is_empty() {
                errors.push(format!("Exercise '{}' has no primary muscle group", id));
            }
            if !record.seconds_per_rep.is_finite() || record.seconds_per_rep <= 0.0 {
                errors.push(format!(
                    "Exercise '{}': seconds per rep must be positive, got {}",
                    id, record.seconds_per_rep
                ));
            }
            if record.equipment.iter().any(|e| e.trim().is_empty()) {
                errors.push(format!("Exercise '{}' lists blank equipment", id));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.len(), 26);
        assert!(catalog.get("deadlift").is_some());
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_default_catalog_has_bodyweight_for_every_core_pattern() {
        let catalog = get_default_catalog();
        for pattern in [
            MovementPattern::Push,
            MovementPattern::Squat,
            MovementPattern::Hinge,
            MovementPattern::Core,
        ] {
            assert!(
                catalog
                    .exercises
                    .values()
                    .any(|e| e.movement_pattern == pattern && e.is_bodyweight()),
                "No bodyweight exercise for {}",
                pattern
            );
        }
    }

    #[test]
    fn test_validate_flags_bad_records() {
        let mut bad = build_default_catalog().exercises["push_up"].clone();
        bad.id = "broken".into();
        bad.seconds_per_rep = 0.0;
        bad.primary_muscle = " ".into();

        let catalog = ExerciseCatalog::from_records(vec![bad]).unwrap();
        let errors = catalog.validate();
        assert_eq!(errors.len(), 2, "{:?}", errors);
    }

    #[test]
    fn test_from_records_rejects_duplicates() {
        let record = build_default_catalog().exercises["burpee"].clone();
        let result = ExerciseCatalog::from_records(vec![record.clone(), record]);
        assert!(matches!(result, Err(Error::CatalogValidation(_))));
    }

    #[test]
    fn test_load_toml_catalog() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            r#"
[[exercises]]
id = "ring_row"
name = "Ring Row"
primary_muscle = "upper_back"
secondary_muscles = ["biceps"]
movement_pattern = "pull"
equipment = ["rings"]
seconds_per_rep = 2.5

[[exercises]]
id = "squat_jump"
name = "Squat Jump"
primary_muscle = "quads"
movement_pattern = "jump"
seconds_per_rep = 2.0
tags = ["explosive"]
"#,
        )
        .unwrap();

        let catalog = ExerciseCatalog::load_from(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        let jump = catalog.get("squat_jump").unwrap();
        assert!(jump.is_bodyweight());
        assert!(!jump.loadable);
        assert!(catalog.validate().is_empty());
    }

    #[test]
    fn test_load_json_catalog() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("catalog.json");
        let records: Vec<_> = build_default_catalog().sorted().into_iter().cloned().collect();
        let json = serde_json::json!({ "exercises": records });
        std::fs::write(&path, json.to_string()).unwrap();

        let catalog = ExerciseCatalog::load_from(&path).unwrap();
        assert_eq!(catalog.len(), build_default_catalog().len());
    }
}
