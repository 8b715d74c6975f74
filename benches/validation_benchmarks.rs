use criterion::{Criterion, black_box, criterion_group, criterion_main};
use formguard::formguard_validation::{parse_rules, path, sanitize, schedule, validators};
use formguard::{FieldSpec, FormValidator};
use serde_json::json;

fn bench_email_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("email_validation");

    let valid_emails = vec![
        "user@example.com",
        "test.user+tag@domain.co.uk",
        "admin@subdomain.example.com",
    ];

    let invalid_emails = vec!["invalid-email", "@example.com", "user@"];

    group.bench_function("valid_emails", |b| {
        b.iter(|| {
            for email in &valid_emails {
                black_box(validators::valid_email(black_box(email)));
            }
        })
    });

    group.bench_function("invalid_emails", |b| {
        b.iter(|| {
            for email in &invalid_emails {
                black_box(validators::valid_email(black_box(email)));
            }
        })
    });

    group.bench_function("email_list", |b| {
        b.iter(|| validators::valid_emails(black_box("a@example.com, b@example.org,c@x.io")))
    });

    group.finish();
}

fn bench_catalog_rules(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_rules");

    group.bench_function("min_length", |b| {
        b.iter(|| validators::evaluate("min_length", black_box("Hello World 123"), Some("5")))
    });

    group.bench_function("alpha_dash", |b| {
        b.iter(|| validators::evaluate("alpha_dash", black_box("jane_doe-99"), None))
    });

    group.bench_function("greater_than", |b| {
        b.iter(|| validators::evaluate("greater_than", black_box(" 42.5 "), Some("17")))
    });

    group.bench_function("in_list", |b| {
        b.iter(|| validators::evaluate("in_list", black_box("books"), Some("music,sports,books")))
    });

    group.bench_function("valid_url", |b| {
        b.iter(|| validators::valid_url(black_box("https://subdomain.example.com/path?query=value")))
    });

    group.bench_function("regex_match", |b| {
        b.iter(|| validators::regex_match(black_box("123-456-7890"), r"/^\d{3}-\d{3}-\d{4}$/"))
    });

    group.finish();
}

fn bench_rule_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_parsing");

    let spec = "callback_unique|trim|required|in_list[a|b|c]|regex_match[/^(x|y)$/]|max_length[8]";

    group.bench_function("parse_rules", |b| {
        b.iter(|| parse_rules(black_box(spec)))
    });

    let parsed = parse_rules(spec);
    group.bench_function("schedule", |b| {
        b.iter(|| schedule::schedule(black_box(&parsed)))
    });

    group.bench_function("field_path", |b| {
        b.iter(|| path::FieldPath::parse(black_box("order[items][0][sku]")))
    });

    group.finish();
}

fn bench_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize");

    group.bench_function("trim_upper", |b| {
        b.iter(|| {
            let trimmed = sanitize::transform("trim", black_box("  hello world  ")).unwrap_or_default();
            sanitize::transform("upper", &trimmed)
        })
    });

    group.bench_function("to_html_entities", |b| {
        b.iter(|| sanitize::transform("to_html_entities", black_box(r#"<a href="x">O'k</a>"#)))
    });

    group.bench_function("do_hash_sha256", |b| {
        b.iter(|| sanitize::do_hash(black_box("correct horse battery staple"), "sha256"))
    });

    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");

    let specs = vec![
        FieldSpec::new("username").rules("trim|required|alpha_dash|min_length[3]|max_length[20]"),
        FieldSpec::new("email").rules("trim|lower|required|valid_email"),
        FieldSpec::new("password").rules("required|min_length[8]"),
        FieldSpec::new("password_confirm").rules("required|matches[password]"),
        FieldSpec::new("tags[]").rules("alpha_numeric|max_length[12]"),
    ];

    let valid = json!({
        "username": " jane_doe ",
        "email": "Jane@Example.com",
        "password": "correct horse",
        "password_confirm": "correct horse",
        "tags": ["rust", "forms", "validation"],
    });

    let invalid = json!({
        "username": "",
        "email": "nope",
        "password": "short",
        "password_confirm": "other",
        "tags": ["ok", "bad!"],
    });

    group.bench_function("validate_passing_form", |b| {
        b.iter(|| {
            let mut validator = FormValidator::new(black_box(valid.clone()));
            validator.add_fields(specs.clone());
            validator.validate(None)
        })
    });

    group.bench_function("validate_failing_form", |b| {
        b.iter(|| {
            let mut validator = FormValidator::new(black_box(invalid.clone()));
            validator.add_fields(specs.clone());
            let _ = validator.validate(None);
            validator.error_string(None, None)
        })
    });

    group.bench_function("bind_nested", |b| {
        let input = json!({"a": {"b": {"c": {"d": "leaf"}}}});
        let segments: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        b.iter(|| path::bind(black_box(&input), &segments))
    });

    group.finish();
}

criterion_group!(
    validation_benches,
    bench_email_validation,
    bench_catalog_rules,
    bench_rule_parsing,
    bench_sanitize,
    bench_engine,
);

criterion_main!(validation_benches);
