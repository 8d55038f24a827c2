use osmc_index::{
    IndexResult, IndexSetSummary, IndexSetWriter, MapBox, MapPoint, ObjectClass, PayloadOffset,
    ZoomLevel, MAX_ZOOM_LEVEL,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::backtrace::Backtrace;
use std::path::{Path, PathBuf};
use std::time::Instant;
use std::{env, fs};

/// Runs a test between a setup and a teardown step.
///
/// `after` runs whether `test` succeeds or not, so temporary index
/// directories are removed even for failing tests. Panics with the error
/// and a backtrace when any step fails.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> IndexResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> IndexResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> IndexResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    let start_time = Instant::now();
    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => after(ctx)
                    .map_err(|e| (format!("After run failed: {:?}", e), backtrace.to_string())),
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });
    let elapsed = start_time.elapsed();

    let (error, backtrace) = match result {
        Ok(Ok(_)) => return,
        Ok(Err((e, bt))) => (e, bt),
        Err(panic_err) => {
            let msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            (format!("Panic: {}", msg), String::new())
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", elapsed);
    eprintln!("Error: {}", error);
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");
    panic!("Test failed: {}", error);
}

/// A scratch map directory for one test.
#[derive(Clone, Debug)]
pub struct TestContext {
    dir: PathBuf,
}

impl TestContext {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

pub fn random_path() -> PathBuf {
    let id = uuid::Uuid::new_v4();
    env::temp_dir().join(format!("osmc-index-{}", id))
}

pub fn create_test_context() -> IndexResult<TestContext> {
    let dir = random_path();
    fs::create_dir_all(&dir)?;
    Ok(TestContext::new(dir))
}

pub fn cleanup(ctx: TestContext) -> IndexResult<()> {
    if ctx.dir().exists() {
        fs::remove_dir_all(ctx.dir())?;
    }
    Ok(())
}

/// One map feature as a converter would hand it to the index layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Feature {
    pub id: u32,
    pub class: ObjectClass,
    /// For points `min == max`.
    pub bbox: MapBox,
    pub zoom_min: ZoomLevel,
    pub zoom_max: ZoomLevel,
    pub offset: PayloadOffset,
}

impl Feature {
    pub fn is_visible_at(&self, zoom: ZoomLevel) -> bool {
        self.zoom_min <= zoom && zoom <= self.zoom_max
    }
}

/// Generates `count` features spread over a 1 x 1 degree square. Ids are
/// unique per class and offsets grow like positions in a data file.
pub fn synthetic_features(seed: u64, count: usize) -> Vec<Feature> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut next_id = [0u32; 3];
    let mut offset: PayloadOffset = 0;
    let mut features = Vec::with_capacity(count);

    for _ in 0..count {
        let class = ObjectClass::ALL[rng.random_range(0..3)];
        let slot = match class {
            ObjectClass::Point => 0,
            ObjectClass::Way => 1,
            ObjectClass::Area => 2,
        };
        next_id[slot] += rng.random_range(1..1_000);

        let min = MapPoint::from_degrees(
            27.0 + rng.random_range(0.0..1.0),
            53.0 + rng.random_range(0.0..1.0),
        );
        let bbox = match class {
            ObjectClass::Point => MapBox::new(min, min),
            _ => {
                let max = MapPoint::new(
                    min.x + rng.random_range(0..50_000),
                    min.y + rng.random_range(0..50_000),
                );
                MapBox::new(min, max)
            }
        };
        let zoom_min = rng.random_range(0..=MAX_ZOOM_LEVEL);
        features.push(Feature {
            id: next_id[slot],
            class,
            bbox,
            zoom_min,
            zoom_max: MAX_ZOOM_LEVEL,
            offset,
        });
        offset += rng.random_range(16..256);
    }
    features
}

/// Writes the index set of `features` into `dir`.
pub fn write_features(dir: &Path, features: &[Feature]) -> IndexResult<IndexSetSummary> {
    let mut writer = IndexSetWriter::create(dir)?;
    for f in features {
        match f.class {
            ObjectClass::Point => {
                writer.add_point(f.id, f.bbox.min, f.zoom_min, f.zoom_max, f.offset)
            }
            ObjectClass::Way => writer.add_way(f.id, f.bbox, f.zoom_min, f.zoom_max, f.offset),
            ObjectClass::Area => writer.add_area(f.id, f.bbox, f.zoom_min, f.zoom_max, f.offset),
        };
    }
    writer.finish()
}
