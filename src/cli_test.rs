use clap::Parser;

use super::*;

#[test]
fn test_parse_send() {
    let cmd = Command::try_parse_from([
        "research",
        "send",
        "-f",
        "deck.pptx",
        "--file",
        "notes.docx",
        "--conversation",
        "convo-1",
        "Summarize the deck",
    ])
    .unwrap();

    assert_eq!(
        cmd.action(),
        Some(&Action::Send {
            files: vec!["deck.pptx".to_string(), "notes.docx".to_string()],
            conversation: Some("convo-1".to_string()),
            prompt: "Summarize the deck".to_string(),
        })
    );
}

#[test]
fn test_parse_version_without_action() {
    let cmd = Command::try_parse_from(["research", "--version"]).unwrap();
    assert!(cmd.version());
    assert_eq!(cmd.action(), None);
}

#[test]
fn test_parse_rename_requires_title() {
    assert!(Command::try_parse_from(["research", "rename", "convo-1"]).is_err());

    let cmd = Command::try_parse_from(["research", "rename", "convo-1", "Market sizing"]).unwrap();
    assert_eq!(
        cmd.action(),
        Some(&Action::Rename {
            id: "convo-1".to_string(),
            title: "Market sizing".to_string(),
        })
    );
}

#[test]
fn test_get_config_from_path() {
    let cmd = Command::try_parse_from(["research", "-c", "./testdata/config.toml", "list"]).unwrap();
    let config = cmd.get_config().unwrap();
    assert!(config.general.verbose);
}
