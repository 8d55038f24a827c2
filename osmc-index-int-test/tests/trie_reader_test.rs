use osmc_index::{IdIndex, IndexError, RadixTrie, TrieReader, TrieReaderConfig};
use osmc_index_int_test::test_util::{cleanup, create_test_context, run_test};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};

#[ctor::ctor]
fn init() {
    colog::init();
}

fn random_mapping(seed: u64, count: usize) -> HashMap<u32, u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut mapping = HashMap::new();
    while mapping.len() < count {
        let id = rng.random::<u32>();
        let offset = rng.random::<u32>();
        mapping.entry(id).or_insert(offset);
    }
    mapping
}

#[test]
fn test_all_cache_depths_agree() {
    run_test(
        || create_test_context(),
        |ctx| {
            let mapping = random_mapping(11, 20_000);
            let trie: RadixTrie = mapping.iter().map(|(id, offset)| (*id, *offset)).collect();
            let path = ctx.file("points.idx");
            trie.write_to_path(&path)?;

            let mut rng = StdRng::seed_from_u64(12);
            let probes: Vec<u32> = (0..5_000).map(|_| rng.random::<u32>()).collect();

            for depth in 0..=6 {
                let config = TrieReaderConfig::builder().cache_depth(depth).build();
                let reader = TrieReader::open_with_config(&path, config)?;
                for (id, offset) in &mapping {
                    assert_eq!(reader.lookup(*id)?, Some(*offset));
                }
                for id in &probes {
                    assert_eq!(reader.lookup(*id)?, mapping.get(id).copied());
                }
                let stats = reader.stats();
                assert_eq!(stats.lookups, (mapping.len() + probes.len()) as u64);
                assert_eq!(stats.cache_entries, 16u64.pow(depth as u32));
                log::info!("depth {}: {:?}", depth, stats);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_shared_reader_across_threads() {
    run_test(
        || create_test_context(),
        |ctx| {
            let mapping = random_mapping(21, 10_000);
            let trie: RadixTrie = mapping.iter().map(|(id, offset)| (*id, *offset)).collect();
            let path = ctx.file("ways.idx");
            trie.write_to_path(&path)?;
            let reader = TrieReader::open(&path)?;

            let entries: Vec<(u32, u32)> = mapping.into_iter().collect();
            let chunks: Vec<Vec<(u32, u32)>> = entries.chunks(1_250).map(|c| c.to_vec()).collect();
            let handles: Vec<_> = chunks
                .into_iter()
                .map(|chunk| {
                    let reader = reader.clone();
                    std::thread::spawn(move || {
                        chunk
                            .iter()
                            .all(|(id, offset)| reader.find_offset(*id) == Some(*offset))
                    })
                })
                .collect();
            for handle in handles {
                assert!(handle.join().unwrap_or(false));
            }
            assert_eq!(reader.stats().lookups, entries.len() as u64);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_damaged_child_offset_is_reported() {
    run_test(
        || create_test_context(),
        |ctx| {
            let trie: RadixTrie = [(0x0000_0001u32, 10u32)].into_iter().collect();
            let path = ctx.file("areas.idx");
            trie.write_to_path(&path)?;

            // point the root's nibble 1 slot at a misaligned offset
            let mut file = OpenOptions::new().write(true).open(&path)?;
            file.seek(SeekFrom::Start(8))?;
            file.write_all(&100i64.to_le_bytes())?;
            file.flush()?;
            drop(file);

            let reader =
                TrieReader::open_with_config(&path, TrieReaderConfig::without_cache())?;
            let err = reader.lookup(1).err();
            assert!(matches!(err, Some(IndexError::Corrupted(_))));
            assert_eq!(reader.find_offset(1), None);

            // the cache walks the same record when it is built
            let result = TrieReader::open_with_config(
                &path,
                TrieReaderConfig::builder().cache_depth(2).build(),
            );
            assert!(matches!(result, Err(IndexError::Corrupted(_))));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
