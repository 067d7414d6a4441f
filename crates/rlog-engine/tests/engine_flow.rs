use std::fs;
use std::path::{Path, PathBuf};

use rlog_engine::{
    FileSummaryIndex, FilterSpec, Query, QueryMode, RESULT_CAP, RecordParser, SourceError,
    discover, parse, query,
};

fn write(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

const SCENARIO: &str = "[INFO worker-1,05-12 10:00:00.123456]: started job\n  stack frame A\n  stack frame B\n[INFO worker-2,05-12 10:00:02.000000]: done\n";

#[test]
fn multiline_record_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "app.log", SCENARIO.as_bytes());

    let records: Vec<_> = parse([&path], false).map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first.level, "INFO");
    assert_eq!(first.thread, "worker-1");
    assert!(first.content.contains("started job"));
    assert!(first.content.contains("  stack frame A\n  stack frame B\n"));
    assert_eq!(
        first.as_plain_text(),
        "[INFO worker-1,05-12 10:00:00.123456]: started job\n  stack frame A\n  stack frame B\n"
    );
    assert_eq!(first.source.as_ref(), path.as_path());

    let joined: String = records.iter().map(|r| r.raw.as_str()).collect();
    assert_eq!(joined, SCENARIO);
}

#[test]
fn thread_filter_on_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "app.log", SCENARIO.as_bytes());

    let filter = FilterSpec::builder().thread(r"^worker-\d+$").build().unwrap();
    let out: Vec<_> = query([&path], &filter, None, QueryMode::Bounded)
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(out.len(), 2);

    let filter = FilterSpec::builder().thread("^worker-2$").build().unwrap();
    let out: Vec<_> = query([&path], &filter, None, QueryMode::Bounded)
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].content, " done");
}

#[test]
fn orphan_text_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "app.log",
        b"orphan text\n[INFO t,05-12 10:00:00.1]: real entry\n",
    );

    let records: Vec<_> = parse([&path], true).map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content, " real entry");
    assert!(records[0].timestamp.is_some());
}

#[test]
fn unreadable_sources_do_not_fail_the_query() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write(dir.path(), "a.log", b"[1 t,05-12 10:00:00.0]: \xff\xfe\n");
    let good = write(dir.path(), "b.log", b"[1 t,05-12 10:00:00.0]: fine\n");
    let missing = dir.path().join("c.log");

    let out: Vec<_> = query(
        [&bad, &good, &missing],
        &FilterSpec::any(),
        None,
        QueryMode::Unbounded,
    )
    .collect();

    assert_eq!(out.len(), 3);
    assert!(matches!(&out[0], Err(SourceError::UnreadableSource { source_id, .. }) if source_id.as_ref() == bad.as_path()));
    assert_eq!(out[1].as_ref().unwrap().content, " fine");
    assert!(matches!(&out[2], Err(SourceError::UnreadableSource { source_id, .. }) if source_id.as_ref() == missing.as_path()));
}

#[test]
fn bounded_and_unbounded_over_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut text = String::new();
    for i in 0..1200 {
        text.push_str(&format!(
            "[3 pool-{},05-12 10:{:02}:{:02}.000000]: item {}\n",
            i % 4,
            (i / 60) % 60,
            i % 60,
            i
        ));
    }
    write(dir.path(), "part-1.log", text.as_bytes());
    write(dir.path(), "part-2.log", b"[3 pool-0,05-12 23:00:00.0]: last\n");

    let files = discover(&[dir.path()]);
    assert_eq!(files.len(), 2);

    let filter = FilterSpec::builder().level(3).build().unwrap();
    assert_eq!(query(&files, &filter, None, QueryMode::Bounded).count(), RESULT_CAP);
    assert_eq!(query(&files, &filter, None, QueryMode::Unbounded).count(), 1201);
}

#[test]
fn pruned_query_matches_full_scan() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "1.log", b"[1 a,03-01 08:00:00.0]: early\n[1 a,03-01 09:00:00.0]: still early\n");
    write(dir.path(), "2.log", b"[1 b,03-01 10:00:00.0]: inside\nmore\n[1 b,03-01 10:30:00.0]: inside too\n");
    write(dir.path(), "3.log", b"[1 c,03-01 18:00:00.0]: late\n");
    let files = discover(&[dir.path()]);

    let year = 2024;
    let index = FileSummaryIndex::build_with(&RecordParser::new(true).with_year(year), &files);
    assert_eq!(index.len(), 3);

    let filter = FilterSpec::builder()
        .start_time(rlog_engine::parse_time("2024-03-01 09:30:00", year).unwrap())
        .end_time(rlog_engine::parse_time("03-01 11:00:00", year).unwrap())
        .build()
        .unwrap();

    assert_eq!(index.prune(&filter, files.iter().collect::<Vec<_>>()).len(), 1);

    let full: Vec<_> = Query::new(&filter)
        .with_year(year)
        .run(&files)
        .map(|r| r.unwrap())
        .collect();
    let pruned: Vec<_> = Query::new(&filter)
        .with_index(Some(&index))
        .with_year(year)
        .run(&files)
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(full, pruned);
    assert_eq!(pruned.len(), 2);
    assert_eq!(pruned[0].raw, "[1 b,03-01 10:00:00.0]: inside\nmore\n");
}

#[test]
fn stale_index_year_does_not_hide_records() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app.log", b"[1 t,05-12 10:00:00.0]: hit\n");
    let files = discover(&[dir.path()]);

    let this_year = RecordParser::new(true).year();
    let index =
        FileSummaryIndex::build_with(&RecordParser::new(true).with_year(this_year - 1), &files);
    assert_eq!(index.year(), this_year - 1);

    let filter = FilterSpec::builder()
        .start_time(rlog_engine::parse_time("05-12 09:00:00", this_year).unwrap())
        .end_time(rlog_engine::parse_time("05-12 11:00:00", this_year).unwrap())
        .build()
        .unwrap();

    let full: Vec<_> = Query::new(&filter).run(&files).map(|r| r.unwrap()).collect();
    let pruned: Vec<_> = Query::new(&filter)
        .with_index(Some(&index))
        .run(&files)
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(full.len(), 1);
    assert_eq!(pruned, full);
}
