use std::fs;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::TempDir;

use ysm::app::{App, Message, Screen};
use ysm::db::Database;
use ysm::generator::{build_export, default_selection, generate};
use ysm::install::{install, verify_installation};
use ysm::keybindings::Keybindings;
use ysm::model::{Channels, ModelError, Tags};
use ysm::reconcile::{reconcile, sync_subscriptions};
use ysm::settings::{AppPaths, Settings};
use ysm::types::{RemoteChannel, Tag};

fn press(app: &mut App, code: KeyCode) {
    app.update(Message::Key(KeyEvent::new(code, KeyModifiers::NONE)));
}

fn type_text(app: &mut App, text: &str) {
    for ch in text.chars() {
        press(app, KeyCode::Char(ch));
    }
}

#[test]
fn reconciliation_renames_and_drops_channels_with_their_links() -> Result<()> {
    let temp = TempDir::new()?;
    let db = Database::open(temp.path().join("ysm.db"))?;

    let mut remote = vec![
        RemoteChannel::new("a", "Foo", ""),
        RemoteChannel::new("b", "Bar", ""),
    ];
    let first = sync_subscriptions(&db, &mut remote)?;
    assert_eq!(first.inserted, vec!["Foo".to_string(), "Bar".to_string()]);

    let mut tag = Tag::create(&db)?;
    tag.set_channels(&db, &["a".to_string(), "b".to_string()])?;
    let mut foo = db.get_channel("a")?.expect("a is stored");
    foo.set_notes(&db, "keep me")?;
    assert_eq!(db.link_count()?, 2);

    let second = reconcile(
        &db,
        &[RemoteChannel::new("a", "Foo2", "")],
        &Channels::load(&db)?,
    )?;
    assert_eq!(second.updated, vec!["Foo2".to_string()]);
    assert_eq!(second.deleted, vec!["Bar".to_string()]);

    let channels = Channels::load(&db)?;
    assert_eq!(channels.len(), 1);
    let renamed = channels.get("a").expect("a survives");
    assert_eq!(renamed.name, "Foo2");
    assert_eq!(renamed.notes, "keep me");
    assert_eq!(renamed.tag_ids, vec![tag.id]);
    assert_eq!(db.link_count()?, 1);
    Ok(())
}

#[test]
fn tag_names_are_unique_ignoring_case() -> Result<()> {
    let db = Database::open(":memory:")?;

    let mut funny = Tag::create(&db)?;
    funny.set_name(&db, "Funny")?;

    let mut other = Tag::create(&db)?;
    let err = other
        .set_name(&db, "funny")
        .expect_err("case variant of another tag's name");
    assert!(matches!(err, ModelError::DuplicateName { .. }));
    assert_ne!(db.get_tag(other.id)?.map(|tag| tag.name), Some("funny".to_string()));

    funny.set_name(&db, "FUNNY")?;
    assert_eq!(db.get_tag(funny.id)?.map(|tag| tag.name), Some("FUNNY".to_string()));
    Ok(())
}

#[test]
fn installed_default_template_renders_selected_channels() -> Result<()> {
    let temp = TempDir::new()?;
    let paths = AppPaths::under(temp.path());
    assert!(verify_installation(&paths).is_err());

    let report = install(&paths)?;
    assert!(report.iter().any(|line| line.starts_with("Created a default settings file")));
    verify_installation(&paths)?;
    let settings = Settings::load(&paths)?;

    let db = Database::open(&settings.db_file)?;
    db.insert_channel(&RemoteChannel::new("c", "Channel C", ""))?;
    db.insert_channel(&RemoteChannel::new("d", "Channel D", "jokes & sketches"))?;
    let hide = db.insert_tag("hide")?;
    let funny = db.insert_tag("funny")?;
    db.insert_link("c", hide)?;
    db.insert_link("d", funny)?;

    let channels = Channels::load(&db)?;
    let tags = Tags::load(&db)?;
    let selected = default_selection(&tags);
    assert_eq!(selected, vec![funny]);

    let export = build_export(&channels, &tags, &selected, &settings.generator.title);
    generate(
        &settings.generator.template_file,
        &settings.generator.output_file,
        &export,
    )?;

    let html = fs::read_to_string(&settings.generator.output_file)?;
    assert!(html.contains("<title>My Youtube Subscriptions</title>"));
    assert!(html.contains("<h2>Channel D</h2>"));
    assert!(html.contains(">funny</span>"));
    assert!(html.contains("jokes &amp; sketches"));
    assert!(!html.contains("Channel C"));
    assert!(!html.contains(">hide</span>"));
    Ok(())
}

#[test]
fn walkthrough_creates_tag_and_applies_it_to_a_channel() -> Result<()> {
    let db = Database::open(":memory:")?;
    db.insert_channel(&RemoteChannel::new("a", "Alpha", ""))?;
    db.insert_channel(&RemoteChannel::new("b", "Beta", ""))?;
    let mut app = App::new(db, Settings::default(), Keybindings::default())?;

    press(&mut app, KeyCode::Char('t'));
    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.screen.name(), "tagEntry");
    type_text(&mut app, "music");
    for _ in 0..6 {
        press(&mut app, KeyCode::Tab);
    }
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.screen, Screen::Tag);
    assert_eq!(app.selected_tag().map(|tag| tag.name.as_str()), Some("music"));

    press(&mut app, KeyCode::Char('c'));
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Char('m'));
    assert_eq!(app.screen.name(), "channelModify");
    type_text(&mut app, "great playlists");
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Char(' '));
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.screen, Screen::Channel);

    let beta = app.channels.get("b").expect("beta loaded");
    assert_eq!(beta.notes, "great playlists");
    assert_eq!(beta.tag_ids.len(), 1);
    assert_eq!(app.tags.get(beta.tag_ids[0]).map(|tag| tag.name.as_str()), Some("music"));

    press(&mut app, KeyCode::Char('u'));
    let untagged: Vec<&str> = app
        .visible_channels()
        .iter()
        .map(|channel| channel.name.as_str())
        .collect();
    assert_eq!(untagged, vec!["Alpha"]);

    press(&mut app, KeyCode::Char('q'));
    assert!(app.should_quit);
    Ok(())
}
