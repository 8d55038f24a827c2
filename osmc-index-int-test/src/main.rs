use osmc_index::{IndexResult, IndexSetReader, MapBox, MapPoint, ObjectClass};
use osmc_index_int_test::test_util::{cleanup, create_test_context, synthetic_features, write_features};

fn main() -> IndexResult<()> {
    println!("Starting stress test...");
    let ctx = create_test_context()?;

    let count = 1_000_000;
    let start = std::time::Instant::now();
    let features = synthetic_features(42, count);
    println!("Generated {} features in {:?}", count, start.elapsed());

    let start = std::time::Instant::now();
    let summary = write_features(ctx.dir(), &features)?;
    println!(
        "Wrote {} bytes of indexes in {:?}",
        summary.total_bytes(),
        start.elapsed()
    );

    let reader = IndexSetReader::open(ctx.dir())?;

    let start = std::time::Instant::now();
    let mut found = 0;
    for feature in &features {
        if reader.id_index(feature.class).lookup(feature.id)?.is_some() {
            found += 1;
        }
    }
    println!("Looked up {} ids in {:?}", found, start.elapsed());
    for class in ObjectClass::ALL {
        println!("{:?} id index: {:?}", class, reader.id_stats(class));
    }

    let start = std::time::Instant::now();
    let mut hits = 0;
    for step in 0..100 {
        let x = 27.0 + step as f64 * 0.009;
        let window = MapBox::new(
            MapPoint::from_degrees(x, 53.4),
            MapPoint::from_degrees(x + 0.05, 53.45),
        );
        hits += reader.points_in(&window, Some(14))?.len();
        hits += reader.ways_in(&window, Some(14))?.len();
        hits += reader.areas_in(&window, Some(14))?.len();
    }
    println!("Ran 300 window queries ({} hits) in {:?}", hits, start.elapsed());

    reader.close()?;
    cleanup(ctx)?;
    Ok(())
}
