use std::fmt::Write as _;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const HEADER: &str =
    "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome";

/// Synthetic rows shaped like the Pima reference data. High glucose, or high BMI with age,
/// drives the outcome; roughly one label in twenty is flipped.
pub fn synthetic_csv(rows: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = String::from(HEADER);
    out.push('\n');
    for _ in 0..rows {
        let pregnancies: u32 = rng.random_range(0..=10);
        let glucose: u32 = rng.random_range(60..=199);
        let blood_pressure: u32 = rng.random_range(40..=110);
        let skin_thickness: u32 = rng.random_range(0..=60);
        let insulin: u32 = rng.random_range(0..=300);
        let bmi: f64 = rng.random_range(18.0..50.0);
        let pedigree: f64 = rng.random_range(0.08..2.0);
        let age: u32 = rng.random_range(21..=80);
        let mut diabetic = glucose >= 140 || (bmi > 35.0 && age > 45);
        if rng.random_range(0..20) == 0 {
            diabetic = !diabetic;
        }
        writeln!(
            out,
            "{pregnancies},{glucose},{blood_pressure},{skin_thickness},{insulin},{bmi:.1},{pedigree:.3},{age},{}",
            u8::from(diabetic)
        )
        .expect("write row");
    }
    out
}

pub fn write_synthetic_csv(path: &Path, rows: usize, seed: u64) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create dataset parent dirs");
    }
    std::fs::write(path, synthetic_csv(rows, seed)).expect("write dataset");
}
