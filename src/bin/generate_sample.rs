use std::path::PathBuf;

use anyhow::{Context, Result};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Pick one `(value, score shift)` option uniformly.
    fn pick<'a>(&mut self, options: &'a [(&'a str, f64)]) -> (&'a str, f64) {
        let i = (self.next_f64() * options.len() as f64) as usize;
        options[i.min(options.len() - 1)]
    }

    /// Empty string with probability `p`, otherwise `value`.
    fn sometimes_missing<'a>(&mut self, value: &'a str, p: f64) -> &'a str {
        if self.next_f64() < p { "" } else { value }
    }
}

const GENDERS: &[(&str, f64)] = &[("female", 0.0), ("male", 0.0)];
const ETHNIC_GROUPS: &[(&str, f64)] = &[
    ("group A", -3.0),
    ("group B", -1.5),
    ("group C", 0.0),
    ("group D", 1.5),
    ("group E", 3.0),
];
const PARENT_EDUC: &[(&str, f64)] = &[
    ("some high school", -4.0),
    ("high school", -3.0),
    ("some college", 0.0),
    ("associate's degree", 1.0),
    ("bachelor's degree", 3.0),
    ("master's degree", 4.5),
];
const LUNCH: &[(&str, f64)] = &[("standard", 4.0), ("free/reduced", -6.0)];
const TEST_PREP: &[(&str, f64)] = &[("none", -2.0), ("completed", 4.0)];
const MARITAL: &[(&str, f64)] = &[
    ("married", 0.5),
    ("single", 0.0),
    ("divorced", -0.5),
    ("widowed", 0.0),
];
const SPORT: &[(&str, f64)] = &[("never", -1.5), ("sometimes", 0.0), ("regularly", 1.0)];
const FIRST_CHILD: &[(&str, f64)] = &[("yes", 0.0), ("no", 0.0)];
const TRANSPORT: &[(&str, f64)] = &[("school_bus", 0.0), ("private", 0.0)];
const STUDY_HOURS: &[(&str, f64)] = &[("< 5", -2.5), ("5 - 10", 0.5), ("> 10", 2.0)];

const ROWS: usize = 1000;
const MISSING_RATE: f64 = 0.05;

fn score(rng: &mut SimpleRng, base: f64, shift: f64) -> String {
    let v = rng.gauss(base + shift, 14.0).round().clamp(0.0, 100.0);
    format!("{v}")
}

fn main() -> Result<()> {
    let output_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/student_data.csv"));
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let mut rng = SimpleRng::new(42);
    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;

    // Leading unnamed column mirrors what `DataFrame.to_csv()` writes.
    writer.write_record([
        "",
        "Gender",
        "EthnicGroup",
        "ParentEduc",
        "LunchType",
        "TestPrep",
        "ParentMaritalStatus",
        "PracticeSport",
        "IsFirstChild",
        "NrSiblings",
        "TransportMeans",
        "WklyStudyHours",
        "MathScore",
        "ReadingScore",
        "WritingScore",
    ])?;

    for row_id in 0..ROWS {
        let (gender, _) = rng.pick(GENDERS);
        let (ethnic, ethnic_shift) = rng.pick(ETHNIC_GROUPS);
        let (educ, educ_shift) = rng.pick(PARENT_EDUC);
        let (lunch, lunch_shift) = rng.pick(LUNCH);
        let (prep, prep_shift) = rng.pick(TEST_PREP);
        let (marital, marital_shift) = rng.pick(MARITAL);
        let (sport, sport_shift) = rng.pick(SPORT);
        let (first_child, _) = rng.pick(FIRST_CHILD);
        let (transport, _) = rng.pick(TRANSPORT);
        let (hours, hours_shift) = rng.pick(STUDY_HOURS);
        let siblings = ((rng.next_f64() * 5.0) as u32).to_string();

        let shift = ethnic_shift
            + educ_shift
            + lunch_shift
            + prep_shift
            + marital_shift
            + sport_shift
            + hours_shift;
        // Girls score higher on reading/writing, boys on math.
        let (math_bias, verbal_bias) = if gender == "male" { (3.0, -4.0) } else { (-3.0, 4.0) };

        let math = score(&mut rng, 66.0 + math_bias, shift);
        let reading = score(&mut rng, 69.0 + verbal_bias, shift);
        let writing = score(&mut rng, 68.0 + verbal_bias, shift);

        writer.write_record([
            row_id.to_string().as_str(),
            gender,
            rng.sometimes_missing(ethnic, MISSING_RATE),
            rng.sometimes_missing(educ, MISSING_RATE),
            lunch,
            rng.sometimes_missing(prep, MISSING_RATE),
            rng.sometimes_missing(marital, MISSING_RATE),
            rng.sometimes_missing(sport, MISSING_RATE),
            rng.sometimes_missing(first_child, MISSING_RATE),
            rng.sometimes_missing(&siblings, MISSING_RATE),
            rng.sometimes_missing(transport, MISSING_RATE),
            rng.sometimes_missing(hours, MISSING_RATE),
            math.as_str(),
            reading.as_str(),
            writing.as_str(),
        ])?;
    }
    writer.flush()?;

    println!("Wrote {ROWS} students to {}", output_path.display());
    Ok(())
}
