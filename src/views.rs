//! Server-rendered HTML pages.
//!
//! Each page is a plain function over borrowed view data. Every piece of
//! user-supplied text goes through [`escape`] before it reaches the markup.

use std::fmt::Write;

use axum::http::StatusCode;
use chrono::{Datelike, Utc};

use crate::flash::Flash;
use crate::models::{FeedItem, Meme};
use crate::validation::{MemeForm, ValidationErrors};

pub const APP_NAME: &str = "8M-Chirper";
pub const EMPTY_FEED: &str = "¡No hay memes todavía! Sé el primero en subir uno.";
pub const ANONYMOUS: &str = "Anónimo";

const INPUT_CLASS: &str = "w-full px-4 py-2 border border-gray-300 rounded-lg focus:ring-2 focus:ring-blue-500 focus:border-transparent";

/// Escapes text for use in element content and double-quoted attributes.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, flash: Option<Flash>, body: &str) -> String {
    let mut html = String::new();
    let title = escape(title);
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-gray-100">
    <header class="bg-blue-600 text-white p-4">
        <div class="max-w-4xl mx-auto flex justify-between items-center">
            <h1 class="text-2xl font-bold">{title}</h1>
            <div class="flex items-center gap-4">
                <a href="/login" class="text-white hover:text-gray-200 text-sm">Iniciar Sesión</a>
                <a href="/register" class="bg-white text-blue-600 px-4 py-2 rounded hover:bg-gray-100 text-sm font-semibold">Registrarse</a>
            </div>
        </div>
    </header>
"#
    );

    if let Some(flash) = flash {
        let _ = write!(
            html,
            r#"    <div class="fixed top-4 left-1/2 transform -translate-x-1/2 z-50" role="status">
        <div class="bg-green-500 text-white px-6 py-3 rounded-lg shadow-lg">
            <span>{}</span>
        </div>
    </div>
"#,
            escape(flash.message())
        );
    }

    let _ = write!(
        html,
        r#"    <main class="py-8">
{body}
    </main>
    <footer class="bg-gray-800 text-white p-4 mt-8">
        <div class="max-w-4xl mx-auto text-center">
            <p>&copy; {year} {APP_NAME}</p>
        </div>
    </footer>
</body>
</html>
"#,
        year = Utc::now().year()
    );
    html
}

/// URL input and explanation textarea shared by the create and edit forms.
fn meme_fields(meme_url: &str, explicacion: &str, errors: Option<&ValidationErrors>) -> String {
    let error_for = |field: &str| errors.and_then(|e| e.get(field));
    let mut html = String::new();

    for (field, label) in [("meme_url", "URL del Meme"), ("explicacion", "Explicación")] {
        let failed = error_for(field);
        let border = if failed.is_some() { " border-red-500" } else { "" };
        let _ = write!(
            html,
            r#"            <div class="mb-4">
                <label for="{field}" class="block text-sm font-medium text-gray-700 mb-2">{label}</label>
"#
        );
        if field == "meme_url" {
            let _ = write!(
                html,
                r#"                <input type="url" name="meme_url" id="meme_url" placeholder="https://ejemplo.com/meme.jpg" class="{INPUT_CLASS}{border}" value="{}" required />
"#,
                escape(meme_url)
            );
        } else {
            let _ = write!(
                html,
                r#"                <textarea name="explicacion" id="explicacion" placeholder="Explica por qué este meme es relevante para el 8M..." class="{INPUT_CLASS} resize-none{border}" rows="4" maxlength="1000" required>{}</textarea>
"#,
                escape(explicacion)
            );
        }
        if let Some(message) = failed {
            let _ = write!(
                html,
                r#"                <p class="mt-1 text-sm text-red-500">{}</p>
"#,
                escape(message)
            );
        }
        html.push_str("            </div>\n");
    }
    html
}

fn meme_card(item: &FeedItem) -> String {
    let meme = &item.meme;
    let author = item
        .author
        .as_ref()
        .map(|a| a.name.as_str())
        .unwrap_or(ANONYMOUS);
    let controls = if item.can_mutate {
        format!(
            r#"                    <div class="flex gap-2">
                        <a href="/memes/{id}/edit" class="text-blue-600 hover:underline">Editar</a>
                        <form method="POST" action="/memes/{id}">
                            <input type="hidden" name="_method" value="DELETE" />
                            <button type="submit" class="text-red-600 hover:underline">Eliminar</button>
                        </form>
                    </div>
"#,
            id = meme.id,
        )
    } else {
        String::new()
    };
    format!(
        r#"            <article class="bg-white shadow rounded-lg p-6 w-full" id="meme-{id}">
                <img src="{url}" alt="Meme" class="w-full rounded-lg" loading="lazy" />
                <p class="mt-4 whitespace-pre-line">{text}</p>
                <div class="mt-4 flex justify-between items-center text-sm text-gray-500">
                    <span>{author} · {fecha}</span>
{controls}                </div>
            </article>
"#,
        id = meme.id,
        url = escape(&meme.meme_url),
        text = escape(&meme.explicacion),
        author = escape(author),
        fecha = meme.fecha_subida.format("%d/%m/%Y %H:%M"),
    )
}

/// The home feed: submission form on top, newest memes below.
pub fn feed(
    items: &[FeedItem],
    old: &MemeForm,
    errors: Option<&ValidationErrors>,
    flash: Option<Flash>,
) -> String {
    let mut body = String::new();
    let _ = write!(
        body,
        r#"    <div class="max-w-4xl mx-auto px-4">
        <h1 class="text-3xl font-bold mt-8">Últimos Memes</h1>
        <div class="bg-white shadow rounded-lg p-6 mt-8">
            <form method="POST" action="/memes">
{}                <div class="flex justify-end">
                    <button type="submit" class="bg-blue-600 hover:bg-blue-700 text-white font-semibold py-2 px-6 rounded-lg shadow">Publicar Meme</button>
                </div>
            </form>
        </div>
        <div class="space-y-8 mt-8 flex flex-col items-center">
"#,
        meme_fields(
            old.meme_url.as_deref().unwrap_or_default(),
            old.explicacion.as_deref().unwrap_or_default(),
            errors,
        )
    );

    if items.is_empty() {
        let _ = write!(
            body,
            r#"            <div class="py-12 text-center">
                <p class="mt-4 text-gray-500">{EMPTY_FEED}</p>
            </div>
"#
        );
    } else {
        for item in items {
            body.push_str(&meme_card(item));
        }
    }

    body.push_str("        </div>\n    </div>\n");
    layout("Home Feed", flash, &body)
}

/// Edit form for `meme`. After a rejected submit, `old` carries what the user typed.
pub fn edit(meme: &Meme, old: Option<&MemeForm>, errors: Option<&ValidationErrors>) -> String {
    let (meme_url, explicacion) = match old {
        Some(form) => (
            form.meme_url.as_deref().unwrap_or_default(),
            form.explicacion.as_deref().unwrap_or_default(),
        ),
        None => (meme.meme_url.as_str(), meme.explicacion.as_str()),
    };

    let body = format!(
        r#"    <div class="max-w-2xl mx-auto px-4">
        <h1 class="text-3xl font-bold mt-8">Editar Meme</h1>
        <div class="bg-white shadow rounded-lg p-6 mt-8">
            <form method="POST" action="/memes/{id}">
                <input type="hidden" name="_method" value="PUT" />
{fields}                <div class="flex justify-between">
                    <a href="/" class="bg-gray-400 hover:bg-gray-500 text-white font-semibold py-2 px-4 rounded-lg shadow">Cancelar</a>
                    <button type="submit" class="bg-blue-600 hover:bg-blue-700 text-white font-semibold py-2 px-6 rounded-lg shadow">Actualizar Meme</button>
                </div>
            </form>
        </div>
    </div>
"#,
        id = meme.id,
        fields = meme_fields(meme_url, explicacion, errors),
    );
    layout("Editar Meme", None, &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(
        r#"    <div class="max-w-2xl mx-auto px-4 text-center">
        <h1 class="text-3xl font-bold mt-8">{code}</h1>
        <p class="mt-4 text-gray-600">{message}</p>
        <a href="/" class="inline-block mt-6 text-blue-600 hover:underline">Volver al inicio</a>
    </div>
"#,
        code = status.as_u16(),
        message = escape(message),
    );
    layout(APP_NAME, None, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Author;
    use crate::validation::MEME_URL_INVALID;
    use uuid::Uuid;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;");
    }

    #[test]
    fn empty_feed_shows_placeholder() {
        let html = feed(&[], &MemeForm::default(), None, None);
        assert!(html.contains(EMPTY_FEED));
        assert!(html.contains("<title>Home Feed</title>"));
    }

    #[test]
    fn feed_cards_show_author_or_anonymous() {
        let ana = Author { id: Uuid::new_v4(), name: "Ana <3".into() };
        let items = vec![
            FeedItem {
                meme: Meme::new("https://example.com/a.jpg".into(), "<b>hola</b>".into(), Some(ana.id)),
                author: Some(ana),
                can_mutate: true,
            },
            FeedItem {
                meme: Meme::new("https://example.com/b.jpg".into(), "sin autor".into(), None),
                author: None,
                can_mutate: false,
            },
        ];
        let html = feed(&items, &MemeForm::default(), None, Some(Flash::Created));

        assert!(!html.contains(EMPTY_FEED));
        assert!(html.contains("Ana &lt;3"));
        assert!(html.contains(ANONYMOUS));
        assert!(html.contains("&lt;b&gt;hola&lt;/b&gt;"));
        assert!(html.contains(Flash::Created.message()));
        assert!(html.contains(&format!("/memes/{}/edit", items[0].meme.id)));
        assert!(!html.contains(&format!("/memes/{}/edit", items[1].meme.id)));
        assert_eq!(html.matches("Eliminar</button>").count(), 1);
    }

    #[test]
    fn rejected_form_keeps_input_and_message() {
        let old = MemeForm {
            meme_url: Some("not-a-url".into()),
            explicacion: Some("test".into()),
        };
        let errors = old.validate().unwrap_err();
        let html = feed(&[], &old, Some(&errors), None);

        assert!(html.contains(r#"value="not-a-url""#));
        assert!(html.contains(">test</textarea>"));
        assert!(html.contains(MEME_URL_INVALID));
    }

    #[test]
    fn edit_form_prefills_current_values() {
        let meme = Meme::new("https://example.com/a.jpg".into(), "actual".into(), None);
        let html = edit(&meme, None, None);

        assert!(html.contains(r#"value="https://example.com/a.jpg""#));
        assert!(html.contains(">actual</textarea>"));
        assert!(html.contains(r#"name="_method" value="PUT""#));
        assert!(html.contains(&format!(r#"action="/memes/{}""#, meme.id)));
    }
}
