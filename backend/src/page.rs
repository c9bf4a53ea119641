use std::fmt::Write as _;

use game_core::{GameId, GameStore, ResolvedGame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    En,
    Ar,
}

impl Lang {
    pub const ALL: [Lang; 2] = [Lang::En, Lang::Ar];

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Lang::En),
            "ar" => Some(Lang::Ar),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Ar => "ar",
        }
    }

    pub fn dir(self) -> &'static str {
        match self {
            Lang::En => "ltr",
            Lang::Ar => "rtl",
        }
    }
}

const SANDBOX: &str =
    "allow-scripts allow-same-origin allow-forms allow-popups allow-popups-to-escape-sandbox";

const STYLE: &str = "\
body{margin:0;font-family:system-ui,sans-serif;background:#eef2ff;color:#1f2937}\
main{max-width:80rem;margin:0 auto;padding:2rem 1rem}\
.card{background:#fff;border-radius:.5rem;box-shadow:0 4px 12px rgba(0,0,0,.08);padding:1.5rem;margin-bottom:1.5rem}\
.game-frame{border:0;display:block;margin:0 auto}\
.game-frame.fullscreen{position:fixed;top:0;left:0;width:100%;height:calc(100vh + 18px);overflow:hidden}\
.games{display:grid;grid-template-columns:repeat(auto-fill,minmax(14rem,1fr));gap:.75rem;padding:0;list-style:none}\
.games a{display:block;padding:1rem;background:#eff6ff;border-radius:.5rem;text-decoration:none}";

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn layout(lang: Lang, title: &str, head: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"{code}\" dir=\"{dir}\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n{head}<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        code = lang.code(),
        dir = lang.dir(),
        title = escape_html(title),
    )
}

/// The sandboxed frame. This is the only place an embed URL is written out.
pub fn render_embed(game: &ResolvedGame<'_>) -> String {
    let title = escape_html(&game.record.title);
    let sizing = if game.display.fullscreen {
        "class=\"game-frame fullscreen\"".to_string()
    } else {
        format!(
            "class=\"game-frame\" width=\"{}\" height=\"{}\"",
            game.display.width, game.display.height
        )
    };
    format!(
        "<iframe src=\"{src}\" title=\"{title}\" {sizing} allowfullscreen sandbox=\"{SANDBOX}\" \
         referrerpolicy=\"no-referrer-when-downgrade\" aria-label=\"{title} - Interactive game\"></iframe>",
        src = escape_html(game.record.embed_url()),
    )
}

pub fn render_game_page(lang: Lang, site_name: &str, game: &ResolvedGame<'_>) -> String {
    let title = escape_html(&game.record.title);
    let description = escape_html(&game.record.description);
    let head = format!(
        "<meta name=\"description\" content=\"{description}\">\n\
         <meta property=\"og:title\" content=\"{title}\">\n\
         <meta property=\"og:description\" content=\"{description}\">\n"
    );
    let body = format!(
        "<main>\n<header class=\"card\"><h1>{title}</h1><p>{description}</p></header>\n\
         {embed}\n\
         <section class=\"card\"><h2>How to Play</h2><ul>\
         <li>Click on the game to start interacting</li>\
         <li>Follow the on-screen instructions</li>\
         <li>Complete the game to see your results</li>\
         <li>Try again to improve your score</li></ul></section>\n</main>",
        embed = render_embed(game),
    );
    layout(
        lang,
        &format!("{} | {}", game.record.title, site_name),
        &head,
        &body,
    )
}

pub fn render_not_found(lang: Lang, available: &[GameId]) -> String {
    let mut links = String::new();
    for id in available {
        let id = escape_html(id.as_str());
        let _ = write!(
            links,
            "<li><a href=\"/{code}/game/{id}\">{id}</a></li>",
            code = lang.code()
        );
    }
    let body = format!(
        "<main><div class=\"card\">\n<h1>Game Not Found</h1>\n\
         <p>Oops! The game you're looking for doesn't exist.</p>\n\
         <h2>Available Games:</h2>\n<ul class=\"games\">{links}</ul>\n\
         <p><a href=\"/{code}\">Back to Home</a></p>\n</div></main>",
        code = lang.code(),
    );
    layout(lang, "Game Not Found", "", &body)
}

pub fn render_missing_id(lang: Lang) -> String {
    let body = "<main><div class=\"card\">\n<h1>Game ID Required</h1>\n\
                <p>Please provide a game ID in the URL</p>\n\
                <p><small>Example: /game?id=matching-game-1</small></p>\n</div></main>";
    layout(lang, "Game ID Required", "", body)
}

pub fn render_index(lang: Lang, site_name: &str, store: &GameStore) -> String {
    let mut items = String::new();
    for (id, record) in store.iter() {
        let _ = write!(
            items,
            "<li><a href=\"/{code}/game/{id}\"><strong>{title}</strong><br>{description}</a></li>",
            code = lang.code(),
            id = escape_html(id.as_str()),
            title = escape_html(&record.title),
            description = escape_html(&record.description),
        );
    }
    let body = format!(
        "<main><div class=\"card\">\n<h1>{name}</h1>\n<ul class=\"games\">{items}</ul>\n</div></main>",
        name = escape_html(site_name),
    );
    layout(lang, site_name, "", &body)
}
