use std::io::Write;
use std::sync::Arc;

use clap::CommandFactory;
use eyre::{Context, Result};
use research_chat::backend::new_backend;
use research_chat::cli::{Action, Command};
use research_chat::config::{Configuration, init_logger, verbose};
use research_chat::engine::ChatEngine;
use research_chat::ingest::{RawFile, process_files};
use research_chat::models::{Event, NEW_CONVERSATION_TITLE, Role};
use research_chat::storage::new_storage;
use research_chat::store::{ConversationStore, SharedStore};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Command::new();
    if cmd.version() {
        cmd.print_version();
        return Ok(());
    }

    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let Some(action) = cmd.action().cloned() else {
        Command::command().print_help()?;
        return Ok(());
    };

    let config = cmd.get_config()?;
    Configuration::init(config.clone())?;
    init_logger(&config.log)?;
    verbose!("[+] Logger initialized");

    verbose!("[+] Initializing backend...");
    let backend = new_backend(&config.backend).wrap_err("initializing backend")?;

    verbose!("[+] Initializing storage...");
    let storage = new_storage(&config.storage)
        .await
        .wrap_err("initializing storage")?;
    verbose!("[+] Storage initialized");

    let store = ConversationStore::load(storage).await.into_shared();
    verbose!(
        "[+] Loaded {} conversations",
        store.lock().await.conversations().len()
    );

    match action {
        Action::List => list(&store).await,
        Action::New { title } => {
            let title = title.unwrap_or_else(|| NEW_CONVERSATION_TITLE.to_string());
            let id = store.lock().await.create_conversation(&title).await;
            println!("{}", id);
        }
        Action::Select { id } => {
            let mut store = store.lock().await;
            ensure_exists(&store, &id)?;
            store.select_conversation(&id).await;
        }
        Action::Delete { id } => {
            let mut store = store.lock().await;
            ensure_exists(&store, &id)?;
            store.delete_conversation(&id).await;
        }
        Action::Rename { id, title } => {
            let mut store = store.lock().await;
            ensure_exists(&store, &id)?;
            store.rename_conversation(&id, &title).await;
        }
        Action::Show { id } => show(&store, id.as_deref()).await?,
        Action::Send {
            files,
            conversation,
            prompt,
        } => {
            if let Some(id) = conversation {
                let mut store = store.lock().await;
                ensure_exists(&store, &id)?;
                store.select_conversation(&id).await;
            }

            let engine =
                ChatEngine::new(store.clone(), backend).with_timeout(config.backend.timeout());
            send(engine, &prompt, files).await?;
        }
    }

    Ok(())
}

fn ensure_exists(store: &ConversationStore, id: &str) -> Result<()> {
    if store.conversation(id).is_none() {
        eyre::bail!("conversation {} not found", id);
    }
    Ok(())
}

async fn list(store: &SharedStore) {
    let store = store.lock().await;
    if store.conversations().is_empty() {
        println!("No conversations yet");
        return;
    }

    for conversation in store.conversations() {
        let marker = if store.active_id() == Some(conversation.id()) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {}  {}  ({} messages, {} files, {})",
            marker,
            conversation.id(),
            conversation.title(),
            conversation.len(),
            conversation.files().len(),
            conversation.created_at().format("%Y-%m-%d %H:%M")
        );
    }
}

async fn show(store: &SharedStore, id: Option<&str>) -> Result<()> {
    let store = store.lock().await;
    let conversation = match id {
        Some(id) => store.conversation(id),
        None => store.active_conversation(),
    };
    let Some(conversation) = conversation else {
        eyre::bail!("no conversation to show");
    };

    println!("# {}", conversation.title());
    for file in conversation.files() {
        println!("[file] {} ({})", file.name(), file.mime_type());
    }
    for message in conversation.messages() {
        let role = match message.role() {
            Role::User => "you",
            Role::Model => "model",
        };
        println!("\n[{}]\n{}", role, message.content());
    }
    Ok(())
}

async fn send(engine: ChatEngine, prompt: &str, paths: Vec<String>) -> Result<()> {
    let mut raw_files = Vec::with_capacity(paths.len());
    for path in &paths {
        match RawFile::from_path(path).await {
            Ok(raw) => raw_files.push(raw),
            Err(err) => eprintln!("[!] Skipping {}: {:#}", path, err),
        }
    }

    let batch = process_files(raw_files).await;
    for dropped in batch.dropped() {
        eprintln!("[!] Skipping {}: {}", dropped.name, dropped.reason);
    }
    verbose!("[+] Attached {} files", batch.files().len());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();
    let engine = engine.with_event_tx(Arc::new(event_tx));
    let printer = tokio::spawn(async move {
        let mut stdout = std::io::stdout();
        while let Some(event) = event_rx.recv().await {
            if let Event::Fragment { text, .. } = event {
                let _ = write!(stdout, "{}", text);
                let _ = stdout.flush();
            }
        }
    });

    let outcome = engine.send(prompt, batch.into_files()).await;
    drop(engine);
    if let Err(err) = printer.await {
        log::error!("Output task failed: {}", err);
    }

    let outcome = outcome?;
    if outcome.fragments > 0 {
        println!();
    }
    if let Some(error) = outcome.error {
        eyre::bail!(error);
    }
    Ok(())
}
