use cookiescope::cookies::dictionary::CookieDictionary;
use cookiescope::cookies::parse::{
    parse_request_cookie_header, parse_response_cookie_header, ParseContext,
};
use cookiescope::detection::{detect_matching_signatures, ScriptResource};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const DICTIONARY: &str = r#"{
    "_ga": [{"platform": "Google Analytics", "category": "Analytics"}],
    "_gcl_": [{"platform": "Google Ads", "category": "Marketing", "wildcard": "1"}]
}"#;

fn benchmark_header_parsing(c: &mut Criterion) {
    let dictionary = CookieDictionary::from_json(DICTIONARY).unwrap();
    let ctx = ParseContext {
        dictionary: &dictionary,
        tab_url: "https://www.example.com/",
        frame_id: Some(0),
        snapshot: &[],
    };

    c.bench_function("parse_set_cookie", |b| {
        b.iter(|| {
            parse_response_cookie_header(
                black_box("https://shop.example.com/cart/add"),
                black_box("_ga=GA1.2.3; Domain=example.com; Max-Age=3600; Secure; SameSite=Lax"),
                &ctx,
            )
        })
    });

    let header: String = (0..30)
        .map(|i| format!("cookie{i}=value{i}"))
        .collect::<Vec<_>>()
        .join("; ");
    c.bench_function("parse_cookie_header_30", |b| {
        b.iter(|| {
            parse_request_cookie_header(
                black_box("https://www.example.com/page"),
                black_box(&header),
                &ctx,
            )
        })
    });
}

fn benchmark_detection(c: &mut Criterion) {
    // A large bundle with one deprecated call near the end.
    let mut content = "var x = compute(a, b);\n".repeat(5_000);
    content.push_str("gapi.auth2.init({ client_id: 'id' });\n");
    let scripts = vec![ScriptResource::new("https://site.test/bundle.js", content)];

    c.bench_function("detect_signatures_5k_lines", |b| {
        b.iter(|| black_box(detect_matching_signatures(black_box(&scripts))))
    });
}

criterion_group!(benches, benchmark_header_parsing, benchmark_detection);
criterion_main!(benches);
