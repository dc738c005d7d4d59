//! Streaming batch engine tests

mod test_data_gen;

use tabula_core::config::EngineConfig;
use tabula_core::types::{Label, Value};
use tabula_core::{Error, Result};
use tabula_exec::{read_csv_batches, Engine};
use tabula_frame::{DataFrame, Row, Series};
use tabula_io::{MemorySource, ReaderState};
use test_data_gen::*;

fn engine(batch_size: usize) -> Engine {
    Engine::new(EngineConfig::default().with_batch_size(batch_size))
}

fn bulk(rows: usize) -> DataFrame {
    DataFrame::from_csv(&numeric_csv(rows)).unwrap()
}

#[test]
fn test_consumer_invoked_ceil_n_over_k_times() {
    let source = numeric_source(10);
    for k in [1usize, 3, 4, 7, 10, 25] {
        let mut sizes = Vec::new();
        let summary = engine(k)
            .stream(&source, &mut |df: DataFrame| -> Result<()> {
                sizes.push(df.len());
                Ok(())
            })
            .unwrap();
        assert_eq!(sizes.len(), (10 + k - 1) / k, "batch size {}", k);
        assert!(sizes.iter().all(|&n| n > 0 && n <= k));
        assert!(sizes[..sizes.len() - 1].iter().all(|&n| n == k));
        assert_eq!(sizes.iter().sum::<usize>(), 10);
        assert_eq!(summary.rows, 10);
        assert_eq!(summary.batches, sizes.len());
    }
}

#[test]
fn test_each_batch_is_indexed_from_zero() {
    let mut indexes = Vec::new();
    let mut ids = Vec::new();
    engine(3)
        .stream(&numeric_source(7), &mut |df: DataFrame| -> Result<()> {
            indexes.push(df.index().to_vec());
            ids.extend(df["id"].iter().cloned());
            Ok(())
        })
        .unwrap();
    assert_eq!(indexes, vec![Label::range(3), Label::range(3), Label::range(1)]);
    // rows still arrive in source order
    assert_eq!(ids, (0..7).map(Value::I32).collect::<Vec<_>>());
}

#[test]
fn test_rows_read_gives_batch_offset() {
    let cfg = EngineConfig::default().with_batch_size(2);
    let mut reader = tabula_exec::BatchReader::new("v\n1\n2\n3\n4\n".as_bytes(), &cfg).unwrap();
    let first = reader.next_batch().unwrap().unwrap();
    assert_eq!(reader.rows_read(), 2);
    let second = reader.next_batch().unwrap().unwrap();
    assert_eq!(first.index()[0], Label::Int(0));
    assert_eq!(second.index()[0], Label::Int(0));
    assert_eq!(second["v"], [Value::I32(3), Value::I32(4)]);
    assert_eq!(reader.rows_read(), 4);
}

#[test]
fn test_batches_share_one_type_inference() {
    // the fifth row has no score; later batches still type the column from row 0
    let mut kinds = Vec::new();
    engine(4)
        .stream(&numeric_source(12), &mut |df: DataFrame| -> Result<()> {
            kinds.push(df["score"].iter().find(|v| !v.is_null()).map(Value::kind));
            Ok(())
        })
        .unwrap();
    assert!(kinds.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_empty_source_emits_nothing() {
    for text in ["", "a,b\n"] {
        let mut calls = 0;
        let summary = engine(5)
            .stream(&MemorySource::from(text), &mut |_df: DataFrame| -> Result<()> {
                calls += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(calls, 0);
        assert_eq!(summary.batches, 0);
        assert_eq!(summary.rows, 0);
    }
}

#[test]
fn test_zero_batch_size_rejected() {
    let mut calls = 0;
    let err = engine(0)
        .stream(&numeric_source(3), &mut |_df: DataFrame| -> Result<()> {
            calls += 1;
            Ok(())
        })
        .unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(err.suggestions().iter().any(|s| s.contains("batch size")));
    assert_eq!(calls, 0);

    assert!(engine(0).batch_sum(&numeric_source(3), "value").unwrap_err().is_invalid_argument());
}

#[test]
fn test_consumer_error_returned_unchanged() {
    let mut calls = 0;
    let err = engine(2)
        .stream(&numeric_source(10), &mut |_df: DataFrame| -> Result<()> {
            calls += 1;
            if calls == 2 {
                Err(Error::not_found("sink table"))
            } else {
                Ok(())
            }
        })
        .unwrap_err();
    assert_eq!(calls, 2);
    assert!(matches!(err, Error::NotFound(ref m) if m == "sink table"));
}

#[test]
fn test_batch_reader_iterator() {
    let cfg = EngineConfig::default().with_batch_size(4);
    let text = numeric_csv(9);
    let mut reader = tabula_exec::BatchReader::new(text.as_bytes(), &cfg).unwrap();
    assert_eq!(reader.headers(), ["id", "group", "value", "score"]);
    let sizes: Vec<usize> = reader
        .by_ref()
        .map(|b| b.map(|df| df.len()))
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(sizes, vec![4, 4, 1]);
    assert_eq!(reader.state(), ReaderState::Drained);
    assert_eq!(reader.rows_read(), 9);
    assert_eq!(reader.batches_emitted(), 3);
    assert!(reader.next_batch().unwrap().is_none());
}

#[test]
fn test_read_csv_batches_from_reader() {
    let text = numeric_csv(5);
    let mut total = 0;
    let summary = read_csv_batches(
        text.as_bytes(),
        &EngineConfig::default().with_batch_size(2),
        &mut |df: DataFrame| -> Result<()> {
            total += df.len();
            Ok(())
        },
    )
    .unwrap();
    assert_eq!(total, 5);
    assert_eq!(summary.columns, vec!["id", "group", "value", "score"]);
}

#[test]
fn test_aggregations_are_batch_size_invariant() {
    let n = 53;
    let source = numeric_source(n);
    let reference = engine(n);
    let expect = [
        reference.batch_sum(&source, "value").unwrap(),
        reference.batch_mean(&source, "value").unwrap(),
        reference.batch_min(&source, "value").unwrap(),
        reference.batch_max(&source, "value").unwrap(),
    ];
    for k in [1, 7, 1000, n] {
        let e = engine(k);
        let got = [
            e.batch_sum(&source, "value").unwrap(),
            e.batch_mean(&source, "value").unwrap(),
            e.batch_min(&source, "value").unwrap(),
            e.batch_max(&source, "value").unwrap(),
        ];
        for (g, x) in got.iter().zip(&expect) {
            assert!(approx(*g, *x), "batch size {}: {} vs {}", k, g, x);
        }
    }
}

#[test]
fn test_batch_sum_matches_bulk_sum() {
    let source = numeric_source(10);
    let streamed = engine(3).batch_sum(&source, "value").unwrap();
    let in_memory = bulk(10).column("value").unwrap().sum().unwrap();
    assert!(approx(streamed, in_memory));
}

#[test]
fn test_streaming_moments_match_series() {
    let source = numeric_source(40);
    let e = engine(6);
    let series = Series::from_values(numeric_values(40));
    assert!(approx(e.batch_variance(&source, "value").unwrap(), series.variance().unwrap()));
    assert!(approx(e.batch_std(&source, "value").unwrap(), series.std().unwrap()));
    assert!(approx(e.batch_norm(&source, "value").unwrap(), series.norm().unwrap()));

    let d = e.batch_describe(&source, "value").unwrap();
    assert_eq!(d.count, 40);
    assert!(approx(d.mean, series.mean().unwrap()));
    assert!(approx(d.min, -7.25));
}

#[test]
fn test_streaming_nulls_are_skipped() {
    let source = numeric_source(10);
    let e = engine(3);
    // rows 4 and 9 have no score
    assert_eq!(e.batch_count(&source, "score").unwrap(), 8);
    let expected: f64 = (0..10).filter(|i| i % 5 != 4).map(|i| ((i * 7) % 23) as f64).sum();
    assert!(approx(e.batch_sum(&source, "score").unwrap(), expected));
}

#[test]
fn test_streaming_single_value_and_empty() {
    let one = MemorySource::from("v\n4.5\n");
    let e = engine(10);
    assert_eq!(e.batch_variance(&one, "v").unwrap(), 0.0);
    assert_eq!(e.batch_describe(&one, "v").unwrap().std, 0.0);

    let empty = MemorySource::from("v\n");
    assert_eq!(e.batch_sum(&empty, "v").unwrap(), 0.0);
    assert!(e.batch_mean(&empty, "v").unwrap().is_nan());
    assert!(e.batch_min(&empty, "v").unwrap().is_nan());
}

#[test]
fn test_missing_column_is_not_found() {
    let err = engine(4).batch_sum(&numeric_source(5), "nope").unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("nope"));
}

#[test]
fn test_count_and_nunique() {
    let source = numeric_source(20);
    let e = engine(7);
    assert_eq!(e.batch_count(&source, "group").unwrap(), 20);
    assert_eq!(e.batch_nunique(&source, "group").unwrap(), 4);
    assert_eq!(e.batch_nunique(&source, "id").unwrap(), 20);
}

#[test]
fn test_sum_multiple_and_describe_all() {
    let source = numeric_source(12);
    let e = engine(5);
    let sums = e.batch_sum_multiple(&source, &["id", "value"]).unwrap();
    assert_eq!(sums[0], ("id".to_string(), 66.0));
    assert!(approx(sums[1].1, numeric_values(12).iter().sum()));

    let all = e.batch_describe_all(&source).unwrap();
    let names: Vec<&str> = all.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["id", "value", "score"]);
    assert_eq!(all[2].1.count, 10);
}

#[test]
fn test_batch_aggregate_one_row() {
    let out = engine(4)
        .batch_aggregate(&numeric_source(10), "score", &["sum", "count", "max"])
        .unwrap();
    assert_eq!(out.shape(), (1, 3));
    assert_eq!(out.columns(), ["sum", "count", "max"]);
    assert_eq!(out["count"], [Value::I64(8)]);
    assert_eq!(out["max"], [Value::F64(21.0)]);

    let err = engine(4)
        .batch_aggregate(&numeric_source(10), "score", &["median"])
        .unwrap_err();
    assert!(err.is_invalid_argument());
}

#[test]
fn test_batch_aggregate_multiple_columns() {
    let out = engine(3)
        .batch_aggregate_multiple(
            &numeric_source(10),
            &[("value", &["sum", "max"][..]), ("score", &["count", "avg"][..])],
        )
        .unwrap();
    assert_eq!(out.columns(), ["operation", "value"]);
    assert_eq!(
        out["operation"],
        [
            Value::from("value_sum"),
            Value::from("value_max"),
            Value::from("score_count"),
            Value::from("score_mean"),
        ]
    );
    let got: Vec<f64> = out["value"].iter().map(|v| v.as_f64().unwrap()).collect();
    // scores without rows 4 and 9: 0 7 14 21 12 19 3 10
    let expect = [-5.0, 6.25, 8.0, 86.0 / 8.0];
    for (g, e) in got.iter().zip(expect) {
        assert!(approx(*g, e), "{} vs {}", g, e);
    }

    let e = engine(3);
    let bad = e.batch_aggregate_multiple(&numeric_source(10), &[("value", &["median"][..])]);
    assert!(bad.unwrap_err().is_invalid_argument());
    let missing = e.batch_aggregate_multiple(&numeric_source(10), &[("nope", &["sum"][..])]);
    assert!(missing.unwrap_err().is_not_found());
}

#[test]
fn test_streaming_group_by_matches_bulk() {
    let source = numeric_source(30);
    let e = engine(4);
    let streamed = e.batch_group_by_sum(&source, "group", "score").unwrap();
    let in_memory = bulk(30).group_by_sum("group", "score").unwrap();
    assert_eq!(streamed["group"], in_memory["group"]);
    for (a, b) in streamed["score"].iter().zip(in_memory["score"].iter()) {
        assert!(approx(a.as_f64().unwrap(), b.as_f64().unwrap()));
    }

    let counts = e.batch_group_by_count(&source, "group").unwrap();
    assert_eq!(counts.columns(), ["group", "count"]);
    assert_eq!(counts["count"], [Value::I64(8), Value::I64(8), Value::I64(7), Value::I64(7)]);

    let means = e.batch_group_by_mean(&source, "group", "value").unwrap();
    let north: Vec<f64> = numeric_values(30).into_iter().step_by(4).collect();
    let expect = north.iter().sum::<f64>() / north.len() as f64;
    assert!(approx(means["value"][0].as_f64().unwrap(), expect));
}

#[test]
fn test_dot_product_and_column_stats() {
    let source = numeric_source(10);
    let e = engine(3);
    let expect: f64 = numeric_values(10)
        .iter()
        .enumerate()
        .map(|(i, v)| i as f64 * v)
        .sum();
    assert!(approx(e.batch_dot_product(&source, "id", "value").unwrap(), expect));

    let stats = e.batch_column_stats(&source).unwrap();
    let score = stats.get("score").unwrap();
    assert_eq!(score.total_count, 10);
    assert_eq!(score.null_count, 2);
    assert_eq!(score.min, Some(Value::I32(0)));
}

#[test]
fn test_batch_sort_matches_bulk_sort() {
    let source = numeric_source(25);
    for desc in [false, true] {
        let streamed = engine(4).batch_sort(&source, "score", desc).unwrap();
        let in_memory = bulk(25).sort_values("score", desc).unwrap();
        assert_eq!(streamed["score"], in_memory["score"]);
        assert_eq!(streamed.index(), in_memory.index());
    }
}

#[test]
fn test_batch_sort_text_column() {
    let sorted = engine(2).batch_sort(&numeric_source(8), "group", false).unwrap();
    assert_eq!(sorted["group"][0], Value::from("east"));
    assert_eq!(sorted["group"][7], Value::from("west"));
    assert_eq!(sorted.index()[0], Label::Int(2));
}

#[test]
fn test_batch_normalize_uses_global_stats() {
    let mut zs = Vec::new();
    let summary = engine(3)
        .batch_normalize(&numeric_source(20), "value", &mut |df: DataFrame| -> Result<()> {
            zs.extend(df["value"].iter().filter_map(Value::as_f64));
            Ok(())
        })
        .unwrap();
    assert_eq!(summary.rows, 20);
    let s = Series::from_values(zs);
    assert!(approx(s.mean().unwrap(), 0.0));
    assert!(approx(s.std().unwrap(), 1.0));
}

#[test]
fn test_batch_filter_greater_than_rebatches() {
    let k = 4;
    let mut sizes = Vec::new();
    let mut ids = Vec::new();
    let summary = engine(k)
        .batch_filter_greater_than(&numeric_source(30), "score", 15.0, &mut |df: DataFrame| -> Result<()> {
            sizes.push(df.len());
            assert_eq!(df.index(), Label::range(df.len()).as_slice());
            ids.extend(df["id"].iter().cloned());
            assert!(df["score"].iter().all(|v| v.as_f64().unwrap() > 15.0));
            Ok(())
        })
        .unwrap();

    let expected: Vec<Value> = (0..30i32)
        .filter(|i| i % 5 != 4 && (i * 7) % 23 > 15)
        .map(Value::I32)
        .collect();
    assert!(!expected.is_empty());
    assert_eq!(ids, expected);
    assert_eq!(summary.rows, expected.len());
    assert_eq!(sizes.len(), (expected.len() + k - 1) / k);
    assert!(sizes.iter().all(|&n| n > 0 && n <= k));
}

#[test]
fn test_filter_with_no_matches_emits_nothing() {
    let mut calls = 0;
    let summary = engine(3)
        .batch_filter_greater_than(&numeric_source(10), "value", 1e9, &mut |_df: DataFrame| -> Result<()> {
            calls += 1;
            Ok(())
        })
        .unwrap();
    assert_eq!(calls, 0);
    assert_eq!(summary.batches, 0);
}

#[test]
fn test_batch_sample_seeded() {
    let source = numeric_source(40);
    let e = engine(6);
    let a = e.batch_sample(&source, 7, Some(99)).unwrap();
    let b = e.batch_sample(&source, 7, Some(99)).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 7);
    let labels = a.index().to_vec();
    let mut sorted = labels.clone();
    sorted.sort();
    assert_eq!(labels, sorted);

    let full = bulk(40);
    for row in a.rows() {
        let original = full.loc(row.label()).unwrap();
        assert_eq!(row.values(), original.values());
    }

    assert_eq!(e.batch_sample(&source, 500, Some(1)).unwrap().len(), 40);
}

#[test]
fn test_batch_sample_falls_back_to_config_seed() {
    let source = numeric_source(40);
    let seeded = Engine::new(EngineConfig::default().with_batch_size(5).with_seed(3));
    let a = seeded.batch_sample(&source, 5, None).unwrap();
    let b = seeded.batch_sample(&source, 5, Some(3)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_batch_transform_and_filter() {
    let e = engine(4);
    let source = numeric_source(10);
    let mut ids = Vec::new();
    e.batch_transform(
        &source,
        "id",
        |v| Value::I64(v.as_i64().unwrap_or(0) * 10),
        &mut |df: DataFrame| -> Result<()> {
            ids.extend(df["id"].iter().cloned());
            Ok(())
        },
    )
    .unwrap();
    assert_eq!(ids[9], Value::I64(90));

    let mut kept = Vec::new();
    let summary = e
        .batch_filter(
            &source,
            |r| r.get("group") == Some(&Value::from("west")),
            &mut |df: DataFrame| -> Result<()> {
                kept.extend(df["id"].iter().cloned());
                Ok(())
            },
        )
        .unwrap();
    assert_eq!(kept, vec![Value::I32(3), Value::I32(7)]);
    assert_eq!(summary.batches, 1);
}

#[test]
fn test_batch_transform_multiple_sees_whole_row() {
    let doubled = |r: &Row<'_>| -> Value {
        r.get("value").and_then(Value::as_f64).map_or(Value::Null, |x| Value::F64(x * 2.0))
    };
    // reads the column produced by the previous transform
    let total = |r: &Row<'_>| -> Value {
        match (r.get("id").and_then(Value::as_f64), r.get("doubled").and_then(Value::as_f64)) {
            (Some(a), Some(b)) => Value::F64(a + b),
            _ => Value::Null,
        }
    };
    let transforms: [(&str, &dyn Fn(&Row<'_>) -> Value); 2] = [("doubled", &doubled), ("total", &total)];

    let mut totals = Vec::new();
    let summary = engine(4)
        .batch_transform_multiple(&numeric_source(6), &transforms, &mut |df: DataFrame| -> Result<()> {
            assert_eq!(df.columns(), ["id", "group", "value", "score", "doubled", "total"]);
            totals.extend(df["total"].iter().filter_map(Value::as_f64));
            Ok(())
        })
        .unwrap();
    let expect: Vec<f64> = numeric_values(6)
        .iter()
        .enumerate()
        .map(|(i, v)| i as f64 + 2.0 * v)
        .collect();
    assert_eq!(totals, expect);
    assert_eq!(summary.rows, 6);
    assert_eq!(summary.batches, 2);
    assert_eq!(summary.columns.last().map(String::as_str), Some("total"));
}

#[test]
fn test_batch_vectorized_ops() {
    let e = engine(3);
    let source = numeric_source(6);
    let mut sums = Vec::new();
    e.batch_vectorized_add(&source, "id", "value", "id_plus_value", &mut |df: DataFrame| -> Result<()> {
        sums.extend(df["id_plus_value"].iter().filter_map(Value::as_f64));
        Ok(())
    })
    .unwrap();
    let expect: Vec<f64> = numeric_values(6)
        .iter()
        .enumerate()
        .map(|(i, v)| i as f64 + v)
        .collect();
    assert_eq!(sums, expect);

    let mut products = Vec::new();
    e.batch_vectorized_multiply(&source, "id", "value", "p", &mut |df: DataFrame| -> Result<()> {
        products.extend(df["p"].iter().filter_map(Value::as_f64));
        Ok(())
    })
    .unwrap();
    assert!(approx(products[2], 2.0 * (3.0 - 7.25)));

    let err = e
        .batch_vectorized_add(&source, "id", "missing", "x", &mut |_df: DataFrame| -> Result<()> { Ok(()) })
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_batch_drop_duplicates() {
    let e = engine(3);
    let source = numeric_source(12);
    let mut ids = Vec::new();
    let summary = e
        .batch_drop_duplicates(&source, &["group"], &mut |df: DataFrame| -> Result<()> {
            ids.extend(df["id"].iter().cloned());
            Ok(())
        })
        .unwrap();
    assert_eq!(ids, (0..4).map(Value::I32).collect::<Vec<_>>());
    assert_eq!(summary.rows, 4);
    assert_eq!(summary.batches, 2);

    let dupes = MemorySource::from("a,b\n1,x\n1,x\n2,x\n1,y\n");
    let mut rows = 0;
    e.batch_drop_duplicates(&dupes, &[], &mut |df: DataFrame| -> Result<()> {
        rows += df.len();
        Ok(())
    })
    .unwrap();
    assert_eq!(rows, 3);
}

#[test]
fn test_batch_window_spans_batches() {
    let mut out = Vec::new();
    engine(4)
        .batch_window(&numeric_source(10), "value", 3, "mean", &mut |df: DataFrame| -> Result<()> {
            assert!(df.has_column("value_window_3"));
            out.extend(df["value_window_3"].iter().map(|v| v.as_f64().unwrap()));
            Ok(())
        })
        .unwrap();
    let xs = numeric_values(10);
    for (i, got) in out.iter().enumerate() {
        let lo = i.saturating_sub(2);
        let w = &xs[lo..=i];
        assert!(approx(*got, w.iter().sum::<f64>() / w.len() as f64), "row {}", i);
    }
}

#[test]
fn test_batch_window_skips_nulls() {
    let mut out = Vec::new();
    engine(2)
        .batch_window(&numeric_source(6), "score", 2, "sum", &mut |df: DataFrame| -> Result<()> {
            out.extend(df["score_window_2"].iter().cloned());
            Ok(())
        })
        .unwrap();
    // scores: 0 7 14 21 (null) 12
    assert!(out[4].is_null());
    assert_eq!(out[5], Value::F64(33.0));
}

#[test]
fn test_batch_window_rejects_bad_arguments() {
    let e = engine(2);
    let source = numeric_source(4);
    let mut noop = |_df: DataFrame| -> Result<()> { Ok(()) };
    assert!(e.batch_window(&source, "value", 0, "sum", &mut noop).unwrap_err().is_invalid_argument());
    assert!(e.batch_window(&source, "value", 2, "median", &mut noop).unwrap_err().is_invalid_argument());
    assert!(e.batch_cumulative(&source, "value", "prod", &mut noop).unwrap_err().is_invalid_argument());
}

#[test]
fn test_batch_cumulative() {
    let mut maxes = Vec::new();
    let mut sums = Vec::new();
    let e = engine(3);
    let source = numeric_source(8);
    e.batch_cumulative(&source, "score", "max", &mut |df: DataFrame| -> Result<()> {
        maxes.extend(df["score_cumulative_max"].iter().cloned());
        Ok(())
    })
    .unwrap();
    e.batch_cumulative(&source, "id", "sum", &mut |df: DataFrame| -> Result<()> {
        sums.extend(df["id_cumulative_sum"].iter().filter_map(Value::as_f64));
        Ok(())
    })
    .unwrap();
    assert_eq!(maxes[3], Value::F64(21.0));
    assert!(maxes[4].is_null());
    assert_eq!(maxes[7], Value::F64(21.0));
    assert_eq!(sums, vec![0.0, 1.0, 3.0, 6.0, 10.0, 15.0, 21.0, 28.0]);
}
