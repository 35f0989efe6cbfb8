use argtag::{Command, ErrorKind, Parser};
use expect_test::expect;

use crate::{check, config, exit_codes, parse, parse_with, split};

#[derive(Command, Debug, Default)]
struct Convert {
    #[arg(tag = "--input,required")]
    input: String,

    #[arg(tag = "--output,required")]
    output: String,
}

#[test]
fn missing_required() {
    check::<Convert>(
        config(),
        "--input in.txt",
        expect![[r#"missing required: --output is required"#]],
    );

    let error = parse::<Convert>("--output out.txt").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::MissingRequired);
    assert!(!error.is_request());
}

#[derive(Command, Debug, Default)]
struct Limits {
    #[arg(tag = "-l", min = "1", max = "10")]
    level: u8,

    #[arg(min = "-1.5", max = "1.5")]
    bias: f64,

    #[arg(minlen = "3", maxlen = "8")]
    name: String,

    #[arg(tag = "-j")]
    jobs: usize,

    #[arg(group = "format")]
    json: bool,

    #[arg(group = "format")]
    yaml: bool,
}

#[test]
fn bounds() {
    for level in 1..=10 {
        let limits: Limits = parse(&format!("-l {level}")).unwrap();
        assert_eq!(limits.level, level);
    }

    for level in ["0", "11", "255"] {
        let error = parse::<Limits>(&format!("-l {level}")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidValue, "level {level}");
    }

    check::<Limits>(
        config(),
        "--level 11",
        expect![[r#"invalid value: --level: "11": must be at most 10"#]],
    );

    check::<Limits>(
        config(),
        "--bias -2",
        expect![[r#"invalid value: --bias: "-2": must be at least -1.5"#]],
    );

    check::<Limits>(
        config(),
        "--bias NaN",
        expect![[r#"invalid value: --bias: "NaN": must be at least -1.5"#]],
    );

    check::<Limits>(
        config(),
        "--name ab",
        expect![[r#"invalid value: --name: "ab": must be at least 3 characters long"#]],
    );

    check::<Limits>(
        config(),
        "--name abcdefghi",
        expect![[r#"invalid value: --name: "abcdefghi": must be at most 8 characters long"#]],
    );
}

#[test]
fn numbers() {
    check::<Limits>(
        config(),
        "-j -3",
        expect![[r#"invalid value: --jobs: "-3": negative values aren't allowed"#]],
    );

    check::<Limits>(
        config(),
        "-j 99999999999999999999999",
        expect![[r#"invalid value: --jobs: "99999999999999999999999": out of range for u64"#]],
    );

    check::<Limits>(
        config(),
        "--json=maybe",
        expect![[r#"invalid value: --json: "maybe": expected a boolean (true/false, yes/no, on/off, 1/0)"#]],
    );

    // Single letter answers other than t/f aren't booleans
    for answer in ["y", "n"] {
        let error = parse::<Limits>(&format!("--json={answer}")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidValue, "--json={answer}");
    }
}

#[test]
fn groups() {
    check::<Limits>(
        config(),
        "--json --yaml",
        expect![[r#"conflict: --json and --yaml can't be used together"#]],
    );

    // Setting a flag to false still counts as using it
    check::<Limits>(
        config(),
        "--yaml --json=false",
        expect![[r#"conflict: --json and --yaml can't be used together"#]],
    );

    let limits: Limits = parse("--yaml").unwrap();
    assert!(limits.yaml);
}

#[test]
fn unknown_options() {
    check::<Limits>(config(), "--nope", expect![[r#"unknown option: --nope"#]]);
    check::<Limits>(config(), "-lx", expect![[r#"invalid value: --level: "x": expected an integer"#]]);
    check::<Limits>(config(), "-z", expect![[r#"unknown option: -z"#]]);

    // --version is only built in when there's a version
    check::<Limits>(config(), "--version", expect![[r#"unknown option: --version"#]]);
}

#[test]
fn requests() {
    let error = parse::<Limits>("--json --help --nope").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::HelpRequested);
    assert!(error.is_request());

    let error = parse_with::<Limits>(config().version("1.0"), "--version").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::VersionRequested);
    assert!(error.is_request());
}

#[test]
fn fail() {
    let (config, codes) = exit_codes();
    let parser = Parser::<Convert>::new(config).unwrap();

    let mut out = Vec::new();
    parser.fail_to(&mut out, "something broke").unwrap();

    expect![[r#"
        Usage: prog --input INPUT --output OUTPUT
        prog: something broke
    "#]]
    .assert_eq(&String::from_utf8(out).unwrap());

    assert_eq!(*codes.lock().unwrap(), [1]);
}

#[test]
fn must_parse_exit_codes() {
    let (config, codes) = exit_codes();
    let parser = Parser::<Convert>::new(config.version("1.0")).unwrap();

    let mut convert = Convert::default();
    parser.must_parse(&mut convert, split("--input a --output b"));
    assert!(codes.lock().unwrap().is_empty());
    assert_eq!(convert.output, "b");

    parser.must_parse(&mut Convert::default(), split("--input a"));
    parser.must_parse(&mut Convert::default(), split("--help"));
    parser.must_parse(&mut Convert::default(), split("--version"));

    assert_eq!(*codes.lock().unwrap(), [1, 1, 0]);
}
