use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Write a synthetic occurrence CSV with `n` rows into `path`. Genus cycles
/// through four values with "Boletus" dominating; every tenth year is blank.
pub fn write_occurrence_csv(path: &Path, n: usize) {
    let genus_of = |i: usize| match i % 10 {
        0..=5 => "Boletus",
        6 | 7 => "Amanita",
        8 => "Russula",
        _ => "Morchella",
    };
    let mut df = df!(
        "occurrenceID" => (0..n).map(|i| format!("MYCO-{i:05}")).collect::<Vec<String>>(),
        "catalogNumber" => (0..n).map(|i| format!("C{i}")).collect::<Vec<String>>(),
        "genus" => (0..n).map(|i| genus_of(i).to_string()).collect::<Vec<String>>(),
        "specificEpithet" => (0..n).map(|i| format!("sp{}", i % 13)).collect::<Vec<String>>(),
        "yearCollected" => (0..n)
            .map(|i| if i % 10 == 9 { None } else { Some(1850 + (i % 170) as i32) })
            .collect::<Vec<Option<i32>>>(),
        "occurrenceRemarks" => (0..n).map(|_| String::new()).collect::<Vec<String>>(),
    )
    .unwrap();

    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut file = File::create(path).unwrap();
    CsvWriter::new(&mut file).finish(&mut df).unwrap();
}
