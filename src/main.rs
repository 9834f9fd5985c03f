// ============================================================================
// BlinkWallet - Wallet multi-devises en mode terminal
// ============================================================================
// Affiche les soldes et les taux, permet dépôt / retrait / swap
//
// ARCHITECTURE :
// 1. Wallet (async, Arc<Mutex<Ledger>>) : soldes + RateProvider injecté
// 2. Worker thread : runtime tokio qui exécute les opérations sur le Wallet
// 3. Event loop : rendu ratatui + input clavier, ne bloque jamais sur le réseau
// ============================================================================

use std::io;
use std::sync::{mpsc, Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use blinkwallet::app::{App, Operation, WalletRequest};
use blinkwallet::ledger::{Ledger, Wallet};
use blinkwallet::models::RateTable;
use blinkwallet::settings::Settings;
use blinkwallet::ui::{events::EventHandler, render};

/// Commandes envoyées au worker thread
#[derive(Debug, Clone)]
enum AppCommand {
    /// Exécuter une opération validée sur le wallet
    Execute(WalletRequest),

    /// Recharger les taux depuis le provider
    RefreshRates,
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    /// Opération réussie : message + nouveau snapshot des soldes
    Completed {
        message: String,
        balances: Vec<(String, Decimal)>,
    },

    /// Opération refusée par le ledger
    Failed { error: String },

    /// Taux rechargés
    RatesLoaded { rates: RateTable },

    /// Erreur lors du chargement des taux
    RatesError { error: String },
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois le TUI lancé : on log vers un
// fichier avec rotation quotidienne.
//
//   tail -f ./logs/blinkwallet.log
//   RUST_LOG=blinkwallet=trace cargo run
// ============================================================================

fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = std::path::PathBuf::from("./logs");
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "blinkwallet.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour blinkwallet, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blinkwallet=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("BlinkWallet starting up");

    let settings = Settings::new()?;
    debug!(?settings, "Settings loaded");

    let currencies = settings.currency_set()?;
    let provider = settings.rate_provider()?;
    info!(provider = %provider.name(), currencies = currencies.len(), "Wallet configured");

    let wallet = Wallet::new(Ledger::new(currencies.clone()), provider, settings.rate_timeout());

    let app = Arc::new(Mutex::new(App::new(currencies, wallet.provider_name())));

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(command_rx, result_tx, wallet, app.clone());

    // Premier chargement des taux en arrière-plan
    let _ = command_tx.send(AppCommand::RefreshRates);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, app, &events, command_tx, result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

/// Verrouille l'état de l'app, même si un thread a paniqué en le tenant
fn lock_app(app: &Mutex<App>) -> MutexGuard<'_, App> {
    app.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Background Worker Thread
// ============================================================================
// Thread séparé avec son propre runtime tokio : exécute les opérations du
// wallet (qui peuvent attendre le réseau) sans bloquer l'UI.
// ============================================================================

fn spawn_background_worker(
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
    wallet: Wallet,
    app: Arc<Mutex<App>>,
) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = ?e, "Failed to create tokio runtime, worker not started");
                return;
            }
        };

        // recv() retourne Err quand le channel est fermé : on quitte
        while let Ok(command) = command_rx.recv() {
            info!(?command, "Worker received command");

            let loading = match &command {
                AppCommand::Execute(_) => "Opération en cours...",
                AppCommand::RefreshRates => "Chargement des taux...",
            };
            lock_app(&app).start_loading(Some(loading.to_string()));

            let result = runtime.block_on(handle_command(&wallet, command));
            let _ = result_tx.send(result);

            lock_app(&app).stop_loading();
        }

        info!("Worker thread exiting (channel closed)");
    });
}

/// Exécute une commande sur le wallet et produit le résultat pour l'UI
async fn handle_command(wallet: &Wallet, command: AppCommand) -> AppResult {
    match command {
        AppCommand::RefreshRates => match wallet.rates().await {
            Ok(rates) => AppResult::RatesLoaded { rates },
            Err(e) => AppResult::RatesError {
                error: e.to_string(),
            },
        },

        AppCommand::Execute(request) => {
            let outcome = match &request {
                WalletRequest::Deposit { currency, amount } => wallet
                    .deposit(currency, *amount)
                    .await
                    .map(|_| format!("Deposit {} {} ✓", amount, currency)),
                WalletRequest::Withdraw { currency, amount } => wallet
                    .withdraw(currency, *amount)
                    .await
                    .map(|_| format!("Withdraw {} {} ✓", amount, currency)),
                WalletRequest::Swap { from, to, amount } => wallet
                    .convert(from, to, *amount)
                    .await
                    .map(|received| {
                        format!("Swap {} {} → {} {} ✓", amount, from, received.round_dp(8), to)
                    }),
            };

            match outcome {
                Ok(message) => AppResult::Completed {
                    message,
                    balances: wallet.balances().await,
                },
                Err(e) => AppResult::Failed {
                    error: e.to_string(),
                },
            }
        }
    }
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. Résultats du worker
//   1. Render
//   2. Input
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: Arc<Mutex<App>>,
    events: &EventHandler,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    loop {
        if !lock_app(&app).is_running() {
            break;
        }

        // 0. RÉSULTATS : try_recv() ne bloque pas
        match result_rx.try_recv() {
            Ok(result) => apply_result(&mut lock_app(&app), result),
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {
                error!("Worker thread disconnected!");
                lock_app(&app).set_error("Worker arrêté, redémarrez l'application");
            }
        }

        // 1. RENDER
        terminal.draw(|frame| {
            let app_lock = lock_app(&app);
            render(frame, &app_lock);
        })?;

        // 2. INPUT
        match events.next() {
            Ok(event) => handle_event(&mut lock_app(&app), event, &command_tx),
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

/// Applique un résultat du worker à l'état de l'app
fn apply_result(app: &mut App, result: AppResult) {
    match result {
        AppResult::Completed { message, balances } => {
            info!(%message, "Operation completed");
            app.update_balances(balances);
            app.set_info(message);
        }
        AppResult::Failed { error } => {
            warn!(%error, "Operation failed");
            app.set_error(error);
        }
        AppResult::RatesLoaded { rates } => {
            info!(rates = rates.len(), "Rates updated");
            app.update_rates(rates);
        }
        AppResult::RatesError { error } => {
            error!(%error, "Failed to load rates");
            app.set_error(error);
        }
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================
// Le mode saisie est traité en premier : les lettres tapées (ex: "max BTC")
// ne doivent pas déclencher les raccourcis du dashboard.
// ============================================================================

fn handle_event(app: &mut App, event: blinkwallet::ui::events::Event, command_tx: &mpsc::Sender<AppCommand>) {
    use blinkwallet::ui::events::{
        get_char_from_event, is_backspace_event, is_deposit_event, is_down_event, is_enter_event,
        is_escape_event, is_input_char_event, is_quit_event, is_refresh_event, is_swap_event,
        is_up_event, is_withdraw_event, Event,
    };

    match event {
        // ========================================
        // Input Mode
        // ========================================
        Event::Key(_) if app.is_in_input_mode() && is_escape_event(&event) => {
            info!("User cancelled input");
            app.cancel_input();
        }
        Event::Key(_) if app.is_in_input_mode() && is_enter_event(&event) => match app.submit_input() {
            Ok(request) => {
                info!(?request, "User submitted wallet request");
                let _ = command_tx.send(AppCommand::Execute(request));
            }
            Err(message) => {
                debug!(%message, "Invalid input");
                app.set_error(message);
            }
        },
        Event::Key(_) if app.is_in_input_mode() && is_backspace_event(&event) => {
            app.backspace();
        }
        Event::Key(_) if app.is_in_input_mode() && is_input_char_event(&event) => {
            if let Some(c) = get_char_from_event(&event) {
                app.append_char(c);
            }
        }
        Event::Key(_) if app.is_in_input_mode() => {}

        // ========================================
        // Dashboard
        // ========================================
        Event::Key(_) if is_quit_event(&event) => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }
        Event::Key(_) if is_up_event(&event) => {
            app.cancel_quit();
            app.navigate_up();
        }
        Event::Key(_) if is_down_event(&event) => {
            app.cancel_quit();
            app.navigate_down();
        }
        Event::Key(_) if is_deposit_event(&event) => {
            app.cancel_quit();
            app.start_operation(Operation::Deposit);
        }
        Event::Key(_) if is_withdraw_event(&event) => {
            app.cancel_quit();
            app.start_operation(Operation::Withdraw);
        }
        Event::Key(_) if is_swap_event(&event) => {
            app.cancel_quit();
            app.start_operation(Operation::Swap);
        }
        Event::Key(_) if is_refresh_event(&event) => {
            app.cancel_quit();
            info!("User requested rates refresh");
            let _ = command_tx.send(AppCommand::RefreshRates);
        }
        Event::Key(_) => {
            // Toute autre touche : annule la confirmation de quit
            app.cancel_quit();
        }
        Event::Tick => {}
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
