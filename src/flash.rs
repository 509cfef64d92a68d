//! One-shot success notices carried across the post/redirect/get cycle in a cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    Created,
    Updated,
    Deleted,
}

impl Flash {
    /// Text shown in the toast on the next page view.
    pub fn message(self) -> &'static str {
        match self {
            Flash::Created => "¡Tu meme ha sido publicado!",
            Flash::Updated => "¡Meme actualizado correctamente!",
            Flash::Deleted => "¡Meme eliminado correctamente!",
        }
    }

    // The cookie only names the notice; the text never leaves the server.
    fn code(self) -> &'static str {
        match self {
            Flash::Created => "created",
            Flash::Updated => "updated",
            Flash::Deleted => "deleted",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "created" => Some(Flash::Created),
            "updated" => Some(Flash::Updated),
            "deleted" => Some(Flash::Deleted),
            _ => None,
        }
    }

    /// Adds the flash cookie to `jar`.
    pub fn set(self, jar: CookieJar) -> CookieJar {
        let mut cookie = Cookie::new(FLASH_COOKIE, self.code());
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        jar.add(cookie)
    }

    /// Reads the pending flash, if any, and clears it so it shows only once.
    pub fn take(jar: CookieJar) -> (CookieJar, Option<Flash>) {
        let Some(code) = jar.get(FLASH_COOKIE).map(|c| c.value().to_owned()) else {
            return (jar, None);
        };
        let mut removal = Cookie::from(FLASH_COOKIE);
        removal.set_path("/");
        let flash = Flash::from_code(&code);
        if flash.is_none() {
            tracing::debug!(%code, "Discarding unrecognised flash cookie");
        }
        (jar.remove(removal), flash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_is_consumed_once() {
        let jar = Flash::Updated.set(CookieJar::new());
        assert_eq!(jar.get(FLASH_COOKIE).map(|c| c.value().to_owned()).as_deref(), Some("updated"));

        let (jar, flash) = Flash::take(jar);
        assert_eq!(flash, Some(Flash::Updated));
        assert!(jar.get(FLASH_COOKIE).is_none());

        let (_, again) = Flash::take(jar);
        assert_eq!(again, None);
    }

    #[test]
    fn unknown_codes_are_dropped() {
        let jar = CookieJar::new().add(Cookie::new(FLASH_COOKIE, "<script>"));
        let (jar, flash) = Flash::take(jar);
        assert_eq!(flash, None);
        assert!(jar.get(FLASH_COOKIE).is_none());
    }

    #[test]
    fn messages_match_each_outcome() {
        assert_eq!(Flash::Created.message(), "¡Tu meme ha sido publicado!");
        assert_eq!(Flash::Updated.message(), "¡Meme actualizado correctamente!");
        assert_eq!(Flash::Deleted.message(), "¡Meme eliminado correctamente!");
    }
}
