//! End-to-end tests: plan geographic chunks, "load" each chunk from a
//! synthetic grid, and recombine the pieces.

use chrono::{DateTime, TimeZone, Utc};
use dc_chunker::{
    combine::{combine_geographic_chunks, combine_geographic_chunks_with},
    dataset::GriddedDataset,
    errors::ChunkerError,
    geographic::create_geographic_chunks,
    parallel::ParallelConfig,
};
use ndarray::{Array2, Array3, ArrayD, IxDyn};

fn grid_2d(latitude: &[f64], longitude: &[f64], values: Vec<f32>) -> GriddedDataset {
    let data = ArrayD::from_shape_vec(IxDyn(&[latitude.len(), longitude.len()]), values)
        .expect("values must match grid");
    GriddedDataset::new(latitude.to_vec(), longitude.to_vec(), None)
        .expect("valid coordinates")
        .with_variable("red", data)
        .expect("valid variable")
}

fn hour(h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, h, 0, 0).unwrap()
}

/// Labels for a 0.1 degree grid, generated the same way for every load.
fn label(index: i32) -> f64 {
    f64::from(index) / 10.0
}

/// Simulates a loader: every grid point inside the (inclusive) range, in
/// ascending order, with a value derived from its position.
fn load(latitude: (f64, f64), longitude: (f64, f64)) -> GriddedDataset {
    let inside = |x: f64, range: (f64, f64)| x >= range.0 - 1e-9 && x <= range.1 + 1e-9;
    let lat_idx: Vec<i32> = (-20..=20).filter(|&i| inside(label(i), latitude)).collect();
    let lon_idx: Vec<i32> = (0..=30).filter(|&i| inside(label(i), longitude)).collect();

    let lats: Vec<f64> = lat_idx.iter().map(|&i| label(i)).collect();
    let lons: Vec<f64> = lon_idx.iter().map(|&i| label(i)).collect();
    let data = Array2::from_shape_fn((lats.len(), lons.len()), |(y, x)| {
        (lat_idx[y] * 100 + lon_idx[x]) as f32
    });

    GriddedDataset::new(lats, lons, None)
        .unwrap()
        .with_variable("ndvi", data.into_dyn())
        .unwrap()
}

#[test]
fn test_chunked_load_matches_single_load() {
    let latitude = (-1.0, 1.0);
    let longitude = (0.0, 3.0);

    let plan = create_geographic_chunks(Some(longitude), Some(latitude), 0.5).unwrap();
    assert_eq!(plan.len(), 12);

    let chunks: Vec<GriddedDataset> = plan
        .iter()
        .map(|chunk| load(chunk.latitude, chunk.longitude))
        .collect();
    let combined = combine_geographic_chunks(&chunks).unwrap();

    let single = load(latitude, longitude).reindex_canonical().unwrap();
    assert_eq!(combined, single);
    assert_eq!(combined.latitude().first(), Some(&1.0));
    assert_eq!(combined.latitude().last(), Some(&-1.0));
}

#[test]
fn test_combine_prefers_first_non_missing_value() {
    let left = grid_2d(&[0.0, 0.5], &[10.0, 11.0], vec![1.0, f32::NAN, 3.0, f32::NAN]);
    let right = grid_2d(&[0.5, 1.0], &[10.0, 11.0], vec![30.0, 40.0, 50.0, 60.0]);

    let combined = combine_geographic_chunks(&[left, right]).unwrap();

    assert_eq!(combined.latitude(), &[1.0, 0.5, 0.0]);
    assert_eq!(combined.longitude(), &[10.0, 11.0]);
    assert_eq!(combined.grid_shape(), vec![3, 2]);

    // Boundary row 0.5 is in both chunks: left wins where present
    assert_eq!(combined.sel("red", 0.5, 10.0, None), Some(3.0));
    // Left gap on the boundary filled from the right
    assert_eq!(combined.sel("red", 0.5, 11.0, None), Some(40.0));
    // Gap no chunk covers stays missing
    assert!(combined.sel("red", 0.0, 11.0, None).unwrap().is_nan());
    assert_eq!(combined.sel("red", 1.0, 10.0, None), Some(50.0));
    assert_eq!(combined.sel("red", 0.0, 10.0, None), Some(1.0));
}

#[test]
fn test_combine_fills_gap_from_later_chunk() {
    let left = grid_2d(&[0.0, 0.5], &[10.0], vec![f32::NAN, 2.0]);
    let right = grid_2d(&[0.0], &[10.0], vec![7.0]);

    let combined = combine_geographic_chunks(&[left, right]).unwrap();
    assert_eq!(combined.sel("red", 0.0, 10.0, None), Some(7.0));
    assert_eq!(combined.sel("red", 0.5, 10.0, None), Some(2.0));
}

#[test]
fn test_single_chunk_is_reindexed() {
    let chunk = grid_2d(&[0.0, 1.0, 2.0], &[5.0, 4.0], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let combined = combine_geographic_chunks(&[chunk.clone()]).unwrap();

    assert_eq!(combined.latitude(), &[2.0, 1.0, 0.0]);
    assert_eq!(combined.longitude(), &[4.0, 5.0]);
    assert!(combined.is_canonical());
    assert!(!chunk.is_canonical());

    let expected = ArrayD::from_shape_vec(IxDyn(&[3, 2]), vec![6.0, 5.0, 4.0, 3.0, 2.0, 1.0]).unwrap();
    assert_eq!(combined.variable("red"), Some(&expected));

    // Self-combination changes nothing beyond the reindex
    let doubled = combine_geographic_chunks(&[chunk.clone(), chunk]).unwrap();
    assert_eq!(doubled, combined);
}

#[test]
fn test_axis_layout_independent_of_chunk_order() {
    let a = grid_2d(&[0.0, 0.5], &[10.0, 11.0], vec![1.0, 2.0, 3.0, 4.0]);
    let b = grid_2d(&[1.5, 1.0], &[11.0, 12.0], vec![5.0, 6.0, 7.0, 8.0]);

    let ab = combine_geographic_chunks(&[a.clone(), b.clone()]).unwrap();
    let ba = combine_geographic_chunks(&[b, a]).unwrap();

    assert_eq!(ab.latitude(), ba.latitude());
    assert_eq!(ab.longitude(), ba.longitude());
    assert_eq!(ab.latitude(), &[1.5, 1.0, 0.5, 0.0]);
    assert_eq!(ab.longitude(), &[10.0, 11.0, 12.0]);
    // Outer join leaves cells no chunk covered missing
    assert!(ab.sel("red", 1.5, 10.0, None).unwrap().is_nan());
}

#[test]
fn test_combine_with_time_axis() {
    let first = GriddedDataset::new(vec![0.0], vec![1.0], Some(vec![hour(3), hour(1)]))
        .unwrap()
        .with_variable(
            "swir",
            Array3::from_shape_vec((2, 1, 1), vec![30.0, 10.0]).unwrap().into_dyn(),
        )
        .unwrap();
    let second = GriddedDataset::new(vec![0.0], vec![1.0], Some(vec![hour(2), hour(1)]))
        .unwrap()
        .with_variable(
            "swir",
            Array3::from_shape_vec((2, 1, 1), vec![20.0, 99.0]).unwrap().into_dyn(),
        )
        .unwrap();

    let combined = combine_geographic_chunks(&[first, second]).unwrap();
    assert_eq!(combined.time(), Some(&[hour(1), hour(2), hour(3)][..]));
    assert_eq!(combined.sel("swir", 0.0, 1.0, Some(hour(1))), Some(10.0));
    assert_eq!(combined.sel("swir", 0.0, 1.0, Some(hour(2))), Some(20.0));
    assert_eq!(combined.sel("swir", 0.0, 1.0, Some(hour(3))), Some(30.0));
}

#[test]
fn test_variables_from_one_chunk_survive() {
    let left = grid_2d(&[0.0], &[0.0], vec![1.0]);
    let right = GriddedDataset::new(vec![1.0], vec![0.0], None)
        .unwrap()
        .with_variable("blue", ArrayD::from_elem(IxDyn(&[1, 1]), 9.0))
        .unwrap();

    let combined = combine_geographic_chunks(&[left, right]).unwrap();
    let names: Vec<&str> = combined.variable_names().collect();
    assert_eq!(names, vec!["blue", "red"]);
    assert_eq!(combined.sel("blue", 1.0, 0.0, None), Some(9.0));
    assert!(combined.sel("blue", 0.0, 0.0, None).unwrap().is_nan());
    assert_eq!(combined.sel("red", 0.0, 0.0, None), Some(1.0));
}

#[test]
fn test_parallel_and_sequential_fill_agree() {
    let plan = create_geographic_chunks(Some((0.0, 3.0)), Some((-2.0, 2.0)), 1.0).unwrap();
    let chunks: Vec<GriddedDataset> = plan
        .iter()
        .map(|chunk| load(chunk.latitude, chunk.longitude))
        .collect();

    let parallel = combine_geographic_chunks_with(&chunks, &ParallelConfig::default().with_threshold(0)).unwrap();
    let sequential = combine_geographic_chunks_with(&chunks, &ParallelConfig::sequential()).unwrap();
    assert_eq!(parallel, sequential);
}

#[test]
fn test_parallel_and_sequential_fill_agree_with_time_axis() {
    let times = vec![hour(0), hour(1), hour(2)];
    let chunk = |lat_idx: Vec<i32>| {
        let lats: Vec<f64> = lat_idx.iter().map(|&i| label(i)).collect();
        let data = Array3::from_shape_fn((3, lats.len(), 4), |(t, y, x)| {
            (t as i32 * 10_000 + lat_idx[y] * 100 + x as i32) as f32
        });
        GriddedDataset::new(lats, (0..4).map(label).collect(), Some(times.clone()))
            .unwrap()
            .with_variable("nbart_red", data.into_dyn())
            .unwrap()
    };
    let chunks = vec![chunk(vec![0, 1, 2]), chunk(vec![2, 3, 4]), chunk(vec![4, 5])];

    let parallel = combine_geographic_chunks_with(&chunks, &ParallelConfig::default().with_threshold(0)).unwrap();
    let sequential = combine_geographic_chunks_with(&chunks, &ParallelConfig::sequential()).unwrap();
    assert_eq!(parallel, sequential);

    assert_eq!(parallel.grid_shape(), vec![3, 6, 4]);
    assert_eq!(parallel.latitude()[0], label(5));
    assert_eq!(parallel.sel("nbart_red", label(3), label(2), Some(hour(1))), Some(10_302.0));
    assert_eq!(parallel.sel("nbart_red", label(0), label(3), Some(hour(2))), Some(20_003.0));
}

#[test]
fn test_combining_many_chunks_matches_pairwise_fold() {
    let a = grid_2d(&[0.0, 1.0], &[0.0, 1.0], vec![1.0, 2.0, 3.0, f32::NAN]);
    let b = grid_2d(&[1.0, 2.0], &[0.0, 1.0], vec![10.0, 11.0, 12.0, f32::NAN]);
    let c = grid_2d(
        &[0.0, 1.0, 2.0],
        &[0.0, 1.0],
        vec![100.0, 101.0, 102.0, 103.0, 104.0, 105.0],
    );

    let folded = a.combine_first(&b).unwrap().combine_first(&c).unwrap();
    let combined = combine_geographic_chunks(&[a, b, c]).unwrap();
    assert_eq!(combined, folded);

    assert_eq!(combined.latitude(), &[2.0, 1.0, 0.0]);
    assert_eq!(combined.sel("red", 0.0, 0.0, None), Some(1.0));
    assert_eq!(combined.sel("red", 1.0, 0.0, None), Some(3.0));
    assert_eq!(combined.sel("red", 1.0, 1.0, None), Some(11.0));
    assert_eq!(combined.sel("red", 2.0, 1.0, None), Some(105.0));
}

#[test]
fn test_combine_errors() {
    assert!(matches!(
        combine_geographic_chunks(&[]),
        Err(ChunkerError::EmptyChunkSequence)
    ));

    let timeless = grid_2d(&[0.0], &[0.0], vec![1.0]);
    let timed = GriddedDataset::new(vec![0.0], vec![0.0], Some(vec![hour(0)])).unwrap();
    assert!(matches!(
        combine_geographic_chunks(&[timeless, timed]),
        Err(ChunkerError::AxisMismatch { .. })
    ));
}

#[test]
fn test_reindex_to_absent_labels_is_missing() {
    let ds = grid_2d(&[0.0, 1.0], &[0.0], vec![1.0, 2.0]);
    let reindexed = ds.reindex(&[1.0, 2.0], &[0.0], None).unwrap();

    assert_eq!(reindexed.sel("red", 1.0, 0.0, None), Some(2.0));
    assert!(reindexed.sel("red", 2.0, 0.0, None).unwrap().is_nan());
    assert_eq!(reindexed.sel("red", 0.0, 0.0, None), None);

    assert!(matches!(
        ds.reindex(&[0.0], &[0.0], Some(&[hour(0)])),
        Err(ChunkerError::AxisMismatch { .. })
    ));
}

#[test]
fn test_dataset_validation() {
    assert!(matches!(
        GriddedDataset::new(vec![0.0, 0.0], vec![1.0], None),
        Err(ChunkerError::DuplicateCoordinate { .. })
    ));
    assert!(matches!(
        GriddedDataset::new(vec![f64::NAN], vec![1.0], None),
        Err(ChunkerError::DuplicateCoordinate { .. })
    ));
    assert!(matches!(
        GriddedDataset::new(vec![0.0], vec![1.0], Some(vec![hour(1), hour(1)])),
        Err(ChunkerError::DuplicateCoordinate { .. })
    ));

    let mut ds = GriddedDataset::new(vec![0.0, 1.0], vec![1.0], None).unwrap();
    let err = ds
        .add_variable("red", ArrayD::zeros(IxDyn(&[1, 2])))
        .unwrap_err();
    assert!(matches!(err, ChunkerError::ShapeMismatch { .. }));
    assert!(format!("{}", err).contains("red"));
}
