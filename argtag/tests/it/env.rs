use argtag::Command;
use expect_test::expect;

use crate::{check, config, parse_with, with_env};

#[derive(Command, Debug, Default)]
struct Api {
    #[arg(tag = "--token,env:API_TOKEN")]
    token: String,
}

#[test]
fn seed() {
    let args: Api = parse_with(with_env(&[("API_TOKEN", "test-token-123")]), "").unwrap();
    assert_eq!(args.token, "test-token-123");

    let args: Api = parse_with(with_env(&[("API_TOKEN", "env-val")]), "--token cli-val").unwrap();
    assert_eq!(args.token, "cli-val");
}

#[derive(Command, Debug, Default)]
struct Settings {
    #[arg(tag = "-n,env:COUNT", default = "5")]
    count: u32,

    #[arg(tag = "env")]
    api_key: Option<String>,

    #[arg(tag = "env:HOSTS")]
    hosts: Vec<String>,
}

#[test]
fn precedence() {
    let cases = [
        (Some("1"), Some("2"), 1),
        (Some("1"), None, 1),
        (None, Some("2"), 2),
        (None, None, 5),
    ];

    for (cli, env, expected) in cases {
        let args = match cli {
            Some(cli) => format!("-n {cli}"),
            None => String::new(),
        };

        let vars: Vec<(&str, &str)> = env.map(|env| ("COUNT", env)).into_iter().collect();
        let settings: Settings = parse_with(with_env(&vars), &args).unwrap();

        assert_eq!(settings.count, expected, "cli: {cli:?}, env: {env:?}");
    }
}

#[test]
fn explicit_zeros_win() {
    let settings: Settings = parse_with(with_env(&[("COUNT", "7")]), "-n 0").unwrap();
    assert_eq!(settings.count, 0);

    let settings: Settings = parse_with(with_env(&[("COUNT", "0")]), "").unwrap();
    assert_eq!(settings.count, 0);
}

#[test]
fn default_names() {
    let settings: Settings = parse_with(with_env(&[("API_KEY", "hunter2")]), "").unwrap();
    assert_eq!(settings.api_key.as_deref(), Some("hunter2"));
}

#[test]
fn slices_split_on_commas() {
    let settings: Settings = parse_with(with_env(&[("HOSTS", " a, b,,c ")]), "").unwrap();
    assert_eq!(settings.hosts, ["a", "b", "c"]);

    let settings: Settings = parse_with(with_env(&[("HOSTS", "a,b")]), "--hosts z").unwrap();
    assert_eq!(settings.hosts, ["z"]);

    let settings: Settings = parse_with(with_env(&[("HOSTS", "")]), "").unwrap();
    assert!(settings.hosts.is_empty());
}

#[test]
fn ignored_stages() {
    let settings: Settings =
        parse_with(with_env(&[("COUNT", "9")]).ignore_env(true), "").unwrap();
    assert_eq!(settings.count, 5);

    let settings: Settings =
        parse_with(with_env(&[("COUNT", "9")]).ignore_default(true), "").unwrap();
    assert_eq!(settings.count, 9);

    let settings: Settings =
        parse_with(config().ignore_env(true).ignore_default(true), "").unwrap();
    assert_eq!(settings.count, 0);
}

#[test]
fn invalid_environment() {
    check::<Settings>(
        with_env(&[("COUNT", "-1")]),
        "",
        expect![[r#"invalid value: --count (environment variable COUNT): "-1": negative values aren't allowed"#]],
    );
}

#[derive(Command, Debug, Default)]
struct Deploy {
    #[arg(tag = "required,env:DEPLOY_TOKEN")]
    token: String,

    #[arg(tag = "--target,env:TARGET", group = "where")]
    target: Option<String>,

    #[arg(tag = "--local", group = "where")]
    local: bool,
}

#[test]
fn required_after_env() {
    let deploy: Deploy = parse_with(with_env(&[("DEPLOY_TOKEN", "abc")]), "").unwrap();
    assert_eq!(deploy.token, "abc");

    check::<Deploy>(
        config(),
        "",
        expect![[r#"missing required: --token is required (or environment variable DEPLOY_TOKEN)"#]],
    );
}

#[test]
fn groups_count_the_environment() {
    check::<Deploy>(
        with_env(&[("DEPLOY_TOKEN", "abc"), ("TARGET", "prod")]),
        "--local",
        expect![[r#"conflict: --target and --local can't be used together"#]],
    );

    let deploy: Deploy =
        parse_with(with_env(&[("DEPLOY_TOKEN", "abc"), ("TARGET", "prod")]), "").unwrap();
    assert_eq!(deploy.target.as_deref(), Some("prod"));
    assert!(!deploy.local);
}
