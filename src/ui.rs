use crate::prefs::Theme;
use crate::render::{BoardView, PrinterCard};
use crate::status::DisplayMode;
use dioxus::core::NoOpMutations;
use dioxus::prelude::*;

#[derive(Props, Clone, PartialEq)]
pub struct PageProps {
    pub board: BoardView,
    pub printers: Vec<PrinterCard>,
    pub theme: Option<Theme>,
    pub mode: DisplayMode,
    pub sheet_refresh_ms: u64,
    pub printer_refresh_ms: u64,
}

#[derive(Props, Clone, PartialEq)]
pub struct BoardGridProps {
    pub view: BoardView,
}

#[derive(Props, Clone, PartialEq)]
pub struct PrinterGridProps {
    pub cards: Vec<PrinterCard>,
}

pub fn render_page(props: PageProps) -> String {
    let mut app = VirtualDom::new_with_props(App, props);
    // Build the tree before rendering to avoid SSR panics.
    let mut noop = NoOpMutations {};
    let _ = app.rebuild(&mut noop);
    dioxus_ssr::render(&mut app)
}

pub fn render_board(view: BoardView) -> String {
    let mut app = VirtualDom::new_with_props(BoardGrid, BoardGridProps { view });
    let mut noop = NoOpMutations {};
    let _ = app.rebuild(&mut noop);
    dioxus_ssr::render(&mut app)
}

pub fn render_printers(cards: Vec<PrinterCard>) -> String {
    let mut app = VirtualDom::new_with_props(PrinterGrid, PrinterGridProps { cards });
    let mut noop = NoOpMutations {};
    let _ = app.rebuild(&mut noop);
    dioxus_ssr::render(&mut app)
}

const STYLES: &str = r#"
* { box-sizing: border-box; }
body, html { margin: 0; padding: 0; }
.page { min-height: 100vh; padding: 28px 18px; background: #f4f6fb; color: #1b2233; font-family: "Noto Sans Thai", "Inter", system-ui, sans-serif; }
.page.dark { background: #0b0d13; color: #e9ecf5; }
.shell { width: min(1100px, 100%); margin: 0 auto; display: flex; flex-direction: column; gap: 16px; }
.header { display: flex; align-items: center; justify-content: space-between; gap: 12px; flex-wrap: wrap; }
.title { margin: 0; font-size: 24px; }
.toolbar { display: flex; gap: 8px; flex-wrap: wrap; }
.pill-btn, .mode-btn { padding: 8px 12px; border-radius: 10px; border: 1px solid #c9cfdd; background: transparent; color: inherit; font-weight: 700; cursor: pointer; }
.mode-btn.is-active { background: #3b6cff; border-color: #3b6cff; color: #fff; }
.page.dark .pill-btn, .page.dark .mode-btn { border-color: #262b38; }
.section-title { margin: 8px 0; font-size: 18px; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 12px; }
.card { border-radius: 14px; padding: 16px; background: #fff; border: 1px solid #dde2ee; }
.page.dark .card { background: #141822; border-color: #1f2230; }
.card h3 { margin: 0 0 10px 0; font-size: 16px; }
.card.in-use { border-color: #2fb36b; }
.card.offline { border-color: #e0a030; opacity: 0.85; }
.head { display: flex; justify-content: space-between; align-items: center; gap: 8px; }
.subtitle { font-size: 13px; color: #6b7388; margin: 6px 0; }
.badge { display: inline-flex; align-items: center; gap: 6px; padding: 4px 10px; border-radius: 999px; font-size: 13px; font-weight: 700; }
.badge .dot { width: 8px; height: 8px; border-radius: 50%; background: currentColor; }
.badge.ok, .status-chip.in-use { color: #1f9d57; background: rgba(47,179,107,0.14); }
.badge.idle, .status-chip.idle { color: #d0384a; background: rgba(208,56,74,0.12); }
.status-chip { padding: 4px 8px; border-radius: 999px; font-size: 12px; font-weight: 700; }
.status-chip.offline { color: #b7791f; background: rgba(224,160,48,0.16); }
.bar { height: 6px; border-radius: 6px; background: rgba(127,127,127,0.2); overflow: hidden; margin: 8px 0; }
.fill { height: 100%; background: #2fb36b; }
.actions { display: flex; gap: 6px; flex-wrap: wrap; }
.meta { color: #6b7388; font-size: 14px; }
.error { color: #d0384a; font-size: 13px; }
"#;

const SCRIPT: &str = r#"
(() => {
  const page = document.getElementById('page');
  const board = document.getElementById('board');
  const printers = document.getElementById('printers');
  const themeToggle = document.getElementById('themeToggle');
  const refreshBtn = document.getElementById('refreshBtn');
  const modeBtns = document.querySelectorAll('.mode-btn');

  function applyTheme(theme) {
    const isDark = theme === 'dark';
    page.classList.toggle('dark', isDark);
    themeToggle.textContent = isDark ? '☀️' : '🌙';
  }
  if (!page.dataset.theme) {
    const prefersDark = window.matchMedia && window.matchMedia('(prefers-color-scheme: dark)').matches;
    applyTheme(prefersDark ? 'dark' : 'light');
  } else {
    applyTheme(page.dataset.theme);
  }

  async function savePreferences(body) {
    await fetch('/api/preferences', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(body)
    });
  }

  async function reload(target, url) {
    if (!target) return;
    try {
      const res = await fetch(url, { cache: 'no-store' });
      if (!res.ok) throw new Error(`HTTP ${res.status}`);
      target.innerHTML = await res.text();
    } catch (err) {
      console.error(err);
    }
  }
  const reloadBoard = () => reload(board, '/fragments/board');
  const reloadPrinters = () => reload(printers, '/fragments/printers');

  themeToggle.addEventListener('click', () => {
    const next = page.classList.contains('dark') ? 'light' : 'dark';
    applyTheme(next);
    savePreferences({ theme: next });
  });

  modeBtns.forEach((btn) => btn.addEventListener('click', async () => {
    const mode = btn.dataset.mode;
    modeBtns.forEach((b) => b.classList.toggle('is-active', b.dataset.mode === mode));
    await savePreferences({ display_mode: mode });
    reloadBoard();
  }));

  refreshBtn.addEventListener('click', async () => {
    refreshBtn.disabled = true;
    try {
      await fetch('/api/refresh', { method: 'POST' });
    } finally {
      refreshBtn.disabled = false;
      reloadBoard();
      reloadPrinters();
    }
  });

  printers?.addEventListener('click', async (ev) => {
    const action = ev.target.dataset?.action;
    const card = ev.target.closest('[data-number]');
    if (!action || !card) return;
    const res = await fetch(`/api/printers/${encodeURIComponent(card.dataset.number)}/command`, {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ action })
    });
    reloadPrinters();
    if (!res.ok) return;
    const outcome = await res.json();
    if (outcome.error) {
      alert(outcome.error.kind === 'unreachable'
        ? 'ไม่สามารถเชื่อมต่ออุปกรณ์ได้'
        : `ไม่สำเร็จ: ${outcome.error.message}`);
    }
  });

  function connect() {
    const proto = location.protocol === 'https:' ? 'wss' : 'ws';
    const ws = new WebSocket(`${proto}://${location.host}/ws/updates`);
    ws.onmessage = (ev) => {
      const update = JSON.parse(ev.data);
      // The sheet section comes and goes with the saved API URL.
      if (update.board === 'sheet') board ? reloadBoard() : location.reload();
      if (update.board === 'printers') reloadPrinters();
    };
    ws.onclose = () => setTimeout(connect, 3000);
  }
  connect();

  // Fallback when the socket is down.
  setInterval(reloadBoard, Number(page.dataset.sheetRefresh) || 30000);
  setInterval(reloadPrinters, Number(page.dataset.printerRefresh) || 5000);
})();
"#;

#[component]
fn App(props: PageProps) -> Element {
    let theme = props.theme.map(|t| t.as_str()).unwrap_or_default();
    let page_class = if props.theme == Some(Theme::Dark) { "page dark" } else { "page" };
    let thai_class = if props.mode == DisplayMode::Thai { "mode-btn is-active" } else { "mode-btn" };
    let sheet_class = if props.mode == DisplayMode::Sheet { "mode-btn is-active" } else { "mode-btn" };
    let has_sheet = props.board != BoardView::Disabled;
    let has_printers = !props.printers.is_empty();

    rsx! {
        meta { name: "viewport", content: "width=device-width, initial-scale=1" }
        div {
            id: "page",
            class: "{page_class}",
            "data-theme": "{theme}",
            "data-sheet-refresh": "{props.sheet_refresh_ms}",
            "data-printer-refresh": "{props.printer_refresh_ms}",
            div { class: "shell",
                div { class: "header",
                    h1 { class: "title", "สถานะเครื่องพิมพ์" }
                    div { class: "toolbar",
                        button { class: "{thai_class}", "data-mode": "thai", "ไทย" }
                        button { class: "{sheet_class}", "data-mode": "sheet", "Sheet" }
                        button { id: "refreshBtn", class: "pill-btn", "รีเฟรช" }
                        button { id: "themeToggle", class: "pill-btn", "🌙" }
                    }
                }
                if has_sheet {
                    section {
                        h2 { class: "section-title", "จากชีต" }
                        div { id: "board",
                            BoardGrid { view: props.board.clone() }
                        }
                    }
                }
                if has_printers {
                    section {
                        h2 { class: "section-title", "เครื่องในเครือข่าย" }
                        div { id: "printers",
                            PrinterGrid { cards: props.printers.clone() }
                        }
                    }
                }
            }
        }
        style { dangerous_inner_html: STYLES }
        script { dangerous_inner_html: SCRIPT }
    }
}

#[component]
fn BoardGrid(props: BoardGridProps) -> Element {
    match props.view {
        BoardView::Disabled => rsx! {},
        BoardView::Loading { message } => rsx! {
            p { class: "meta", "{message}" }
        },
        BoardView::Error { message, detail } => {
            let detail = detail.unwrap_or_default();
            rsx! {
                div { class: "meta",
                    p { class: "error", "{message}" }
                    if !detail.is_empty() {
                        p { "{detail}" }
                    }
                }
            }
        }
        BoardView::Cards { updated_at, cards, .. } => rsx! {
            p { class: "meta", "อัปเดตล่าสุด: {updated_at}" }
            div { class: "grid",
                {cards.into_iter().map(|card| {
                    let badge = if card.active { "badge ok" } else { "badge idle" };
                    rsx! {
                        article { class: "card",
                            h3 { "{card.title}" }
                            span { class: "{badge}",
                                span { class: "dot" }
                                "{card.label}"
                            }
                        }
                    }
                })}
            }
        },
    }
}

#[component]
fn PrinterGrid(props: PrinterGridProps) -> Element {
    rsx! {
        div { class: "grid",
            {props.cards.into_iter().map(|card| {
                let error = card.error.clone().unwrap_or_default();
                rsx! {
                    div {
                        class: "card {card.css}",
                        id: "dev-{card.number}",
                        "data-number": "{card.number}",
                        div { class: "head",
                            div { class: "subtitle", "เครื่องที่: {card.number}" }
                            div { class: "status-chip {card.css}", "{card.chip}" }
                        }
                        div { class: "bar",
                            div { class: "fill", style: "width: {card.progress}%" }
                        }
                        div { class: "subtitle", "{card.message}" }
                        if !error.is_empty() {
                            p { class: "error", "{error}" }
                        }
                        div { class: "actions",
                            button { class: "pill-btn", "data-action": "toggle", "สลับ" }
                            button { class: "pill-btn", "data-action": "in-use", "ใช้งาน" }
                            button { class: "pill-btn", "data-action": "idle", "ว่าง" }
                        }
                    }
                }
            })}
        }
    }
}
