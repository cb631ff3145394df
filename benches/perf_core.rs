use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quality_gate::gate::decide;
use quality_gate::insight::parse_insight;
use quality_gate::model::{AnalysisInput, CoverageMetrics};
use quality_gate::normalize::{parse_coverage_report, parse_test_report};
use quality_gate::render::{render_json, render_markdown};

fn synthetic_junit(suite_count: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<testsuites>\n");
    for i in 0..suite_count {
        xml.push_str(&format!(
            "  <testsuite name=\"suite_{i:03}\" tests=\"120\" failures=\"{}\" errors=\"0\">\n",
            i % 3
        ));
        for t in 0..20 {
            xml.push_str(&format!(
                "    <testcase classname=\"tests.suite_{i:03}\" name=\"test_{t:03}\" time=\"0.01\"/>\n"
            ));
        }
        xml.push_str("  </testsuite>\n");
    }
    xml.push_str("</testsuites>\n");
    xml
}

const COVERAGE_XML: &str = r#"<?xml version="1.0" ?>
<coverage version="7.4.0" line-rate="0.963" branch-rate="0" lines-covered="963" lines-valid="1000">
  <packages><package name="app" line-rate="0.963"/></packages>
</coverage>"#;

fn bench_normalize(c: &mut Criterion) {
    let junit = synthetic_junit(200);
    c.bench_function("parse_test_report_200_suites", |b| {
        b.iter(|| parse_test_report(black_box(&junit), "junit.xml").unwrap());
    });
    c.bench_function("parse_coverage_report", |b| {
        b.iter(|| parse_coverage_report(black_box(COVERAGE_XML), "coverage.xml").unwrap());
    });
}

fn bench_decide_and_render(c: &mut Criterion) {
    let counts = parse_test_report(&synthetic_junit(1), "junit.xml").unwrap();
    let input = AnalysisInput::new(
        counts.into_metrics().unwrap(),
        CoverageMetrics::new(96.3, 80.0).unwrap(),
    );

    c.bench_function("decide", |b| {
        b.iter(|| decide(black_box(&input)));
    });

    let output = decide(&input);
    c.bench_function("render_markdown_and_json", |b| {
        b.iter(|| {
            black_box(render_markdown(black_box(&output), None));
            black_box(render_json(black_box(&output), None).unwrap());
        });
    });
}

fn bench_parse_insight(c: &mut Criterion) {
    let reply = "Sure, here is the JSON:\n{\"executive_summary\": \"One test fails\n in auth\", \"risk_explanation\": \"High\", \"improvement_suggestions\": [\"a\", \"b\",]}";
    c.bench_function("parse_insight_with_repair", |b| {
        b.iter(|| parse_insight(black_box(Some(reply))).unwrap());
    });
}

criterion_group!(benches, bench_normalize, bench_decide_and_render, bench_parse_insight);
criterion_main!(benches);
