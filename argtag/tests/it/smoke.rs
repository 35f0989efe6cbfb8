use std::{path::PathBuf, str::FromStr};

use argtag::{Command, ParsedValue, Value};
use expect_test::expect;

use crate::{check, config, parse};

#[derive(Command, Debug, Default, PartialEq)]
struct Basic {
    #[arg(tag = "-v")]
    verbose: bool,

    #[arg(tag = "-o,--output")]
    output: String,

    #[arg(tag = "-c,--count")]
    count: i32,
}

#[test]
fn options() {
    check::<Basic>(
        config(),
        "-v --output test.txt -c 42",
        expect![[r#"
            Basic {
                verbose: true,
                output: "test.txt",
                count: 42,
            }
        "#]],
    );

    check::<Basic>(
        config(),
        "--count=-7 -o=x",
        expect![[r#"
            Basic {
                verbose: false,
                output: "=x",
                count: -7,
            }
        "#]],
    );

    check::<Basic>(
        config(),
        "-c not_a_number",
        expect![[r#"invalid value: --count: "not_a_number": expected an integer"#]],
    );
}

#[test]
fn short_clusters() {
    let args: Basic = parse("-vc42").unwrap();
    assert!(args.verbose);
    assert_eq!(args.count, 42);

    // The last option of a cluster takes the next argument when the cluster
    // has nothing left
    let args: Basic = parse("-vc 9000 -otest").unwrap();
    assert!(args.verbose);
    assert_eq!(args.count, 9000);
    assert_eq!(args.output, "test");
}

#[test]
fn required_arguments_are_taken_verbatim() {
    let args: Basic = parse("--output -v").unwrap();
    assert_eq!(args.output, "-v");
    assert!(!args.verbose);

    check::<Basic>(
        config(),
        "-o --",
        expect![[r#"missing value: -o requires a value"#]],
    );

    let args: Basic = parse("-v --verbose=no").unwrap();
    assert!(!args.verbose);
}

#[test]
fn last_value_wins() {
    let args: Basic = parse("-c 1 -c 2 --count 3").unwrap();
    assert_eq!(args.count, 3);
}

#[test]
fn idempotent() {
    let first: Basic = parse("-v -c 5").unwrap();
    let second: Basic = parse("-v -c 5").unwrap();
    assert_eq!(first, second);
}

#[derive(Command, Debug, Default)]
struct Tagged {
    #[arg(tag = "-t")]
    tags: Vec<String>,

    #[arg(tag = "positional")]
    files: Vec<String>,
}

#[test]
fn slices() {
    check::<Tagged>(
        config(),
        "-t tag1 -t tag2 file1.txt file2.txt",
        expect![[r#"
            Tagged {
                tags: [
                    "tag2",
                ],
                files: [
                    "file1.txt",
                    "file2.txt",
                ],
            }
        "#]],
    );

    let args: Tagged = parse("a -t x b -- -t c").unwrap();
    assert_eq!(args.tags, ["x"]);
    assert_eq!(args.files, ["a", "b", "-t", "c"]);

    let args: Tagged = parse("- -").unwrap();
    assert_eq!(args.files, ["-", "-"]);
}

#[derive(Command, Debug, Default)]
struct Transfer {
    #[arg(tag = "positional,required")]
    source: PathBuf,

    #[arg(tag = "positional")]
    dest: Option<PathBuf>,
}

#[test]
fn positionals() {
    let args: Transfer = parse("a.txt").unwrap();
    assert_eq!(args.source, PathBuf::from("a.txt"));
    assert_eq!(args.dest, None);

    let args: Transfer = parse("a.txt b.txt").unwrap();
    assert_eq!(args.dest, Some(PathBuf::from("b.txt")));

    check::<Transfer>(
        config(),
        "a.txt b.txt c.txt",
        expect![[r#"too many positionals: unexpected argument "c.txt""#]],
    );

    check::<Transfer>(
        config(),
        "",
        expect![[r#"missing required: source is required"#]],
    );
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Value)]
enum Color {
    #[default]
    Auto,
    Always,
    Never,
    NoTty,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Value)]
enum Level {
    #[default]
    Off,
    Verbose,
    Numeric(u8),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Value)]
struct Port(u16);

#[derive(Debug, Clone, Default, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

impl FromStr for Point {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("{s:?} should look like X,Y"))?;

        let coordinate = |text: &str| {
            text.parse::<i32>()
                .map_err(|err| format!("bad coordinate {text:?}: {err}"))
        };

        Ok(Point {
            x: coordinate(x)?,
            y: coordinate(y)?,
        })
    }
}

impl ParsedValue for Point {}

#[derive(Command, Debug, Default)]
struct Values {
    #[arg(tag = "optional", default = "always")]
    color: Color,

    level: Level,

    #[arg(min = "1024")]
    port: Port,

    origin: Option<Point>,

    ratio: f32,
}

#[test]
fn user_values() {
    let args: Values = parse("--color=NEVER --level verbose --port 8080 --origin 3,-4").unwrap();
    assert_eq!(args.color, Color::Never);
    assert_eq!(args.level, Level::Verbose);
    assert_eq!(args.port, Port(8080));
    assert_eq!(args.origin, Some(Point { x: 3, y: -4 }));

    let args: Values = parse("--color=no-tty --level 3 --ratio 0.5").unwrap();
    assert_eq!(args.color, Color::NoTty);
    assert_eq!(args.level, Level::Numeric(3));
    assert_eq!(args.ratio, 0.5);

    check::<Values>(
        config(),
        "--color=loud",
        expect![[r#"invalid value: --color: "loud": "loud" should be one of auto, always, never, no-tty"#]],
    );

    check::<Values>(
        config(),
        "--level 300",
        expect![[r#"invalid value: --level: "300": out of range for u8"#]],
    );

    check::<Values>(
        config(),
        "--port 80",
        expect![[r#"invalid value: --port: "80": must be at least 1024"#]],
    );

    check::<Values>(
        config(),
        "--origin 3",
        expect![[r#"invalid value: --origin: "3": "3" should look like X,Y"#]],
    );
}

#[test]
fn optional_discipline() {
    // A bare optional option stores its default
    let args: Values = parse("--color").unwrap();
    assert_eq!(args.color, Color::Always);

    // ... and so does leaving it out entirely
    let args: Values = parse("").unwrap();
    assert_eq!(args.color, Color::Always);

    // The argument must be attached
    check::<Values>(
        config(),
        "--color never",
        expect![[r#"too many positionals: unexpected argument "never""#]],
    );
}

#[derive(Command, Debug, Default)]
struct Skipped {
    #[arg(tag = "-")]
    cache: Vec<u8>,

    #[arg(tag = "--dry-run,-n")]
    r#dry_run: bool,
}

#[test]
fn skipped_and_raw_fields() {
    let args: Skipped = parse("-n").unwrap();
    assert!(args.dry_run);
    assert!(args.cache.is_empty());

    check::<Skipped>(
        config(),
        "--cache 1",
        expect![[r#"unknown option: --cache"#]],
    );
}
