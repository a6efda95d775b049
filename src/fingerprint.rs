//! Browser profiles for outbound embed fetches.
//!
//! Hosting sites serve their player pages to browsers loading them inside
//! an iframe. Requests that look like anything else tend to get a captcha
//! or an empty shell page, so every fetch carries a realistic profile.

use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT,
};

/// Headers a browser sends when it loads a player iframe.
#[derive(Debug, Clone)]
pub struct BrowserProfile {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub sec_ch_ua: Option<String>,
    pub sec_ch_ua_platform: Option<String>,
}

const CHROME_VERSIONS: &[(&str, &str)] = &[
    ("131", "131.0.0.0"),
    ("132", "132.0.0.0"),
    ("133", "133.0.0.0"),
    ("134", "134.0.0.0"),
];

const FIREFOX_VERSIONS: &[&str] = &["133.0", "134.0", "135.0"];

const LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.9",
    "id-ID,id;q=0.9,en-US;q=0.8,en;q=0.7",
    "en-US,en;q=0.9,id;q=0.8",
];

#[derive(Debug, Clone, Copy)]
enum Platform {
    MacOS,
    Windows,
    Linux,
}

impl Platform {
    fn random() -> Self {
        let roll: f32 = rand::thread_rng().gen();
        if roll < 0.65 {
            Platform::Windows
        } else if roll < 0.85 {
            Platform::MacOS
        } else {
            Platform::Linux
        }
    }

    fn os_string(self) -> &'static str {
        match self {
            Platform::MacOS => "Macintosh; Intel Mac OS X 10_15_7",
            Platform::Windows => "Windows NT 10.0; Win64; x64",
            Platform::Linux => "X11; Linux x86_64",
        }
    }

    fn sec_ch_platform(self) -> &'static str {
        match self {
            Platform::MacOS => "\"macOS\"",
            Platform::Windows => "\"Windows\"",
            Platform::Linux => "\"Linux\"",
        }
    }
}

/// Chrome on a random desktop platform.
#[must_use]
pub fn chrome_profile() -> BrowserProfile {
    let mut rng = rand::thread_rng();
    let platform = Platform::random();
    let (major, full) = CHROME_VERSIONS
        .choose(&mut rng)
        .copied()
        .unwrap_or(("131", "131.0.0.0"));

    BrowserProfile {
        user_agent: format!(
            "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{full} Safari/537.36",
            platform.os_string()
        ),
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
            .to_string(),
        accept_language: random_accept_language(),
        sec_ch_ua: Some(format!(
            "\"Google Chrome\";v=\"{major}\", \"Chromium\";v=\"{major}\", \"Not_A Brand\";v=\"24\""
        )),
        sec_ch_ua_platform: Some(platform.sec_ch_platform().to_string()),
    }
}

/// Firefox on a random desktop platform.
#[must_use]
pub fn firefox_profile() -> BrowserProfile {
    let mut rng = rand::thread_rng();
    let platform = Platform::random();
    let version = FIREFOX_VERSIONS.choose(&mut rng).copied().unwrap_or("134.0");

    BrowserProfile {
        user_agent: format!(
            "Mozilla/5.0 ({}; rv:{version}) Gecko/20100101 Firefox/{version}",
            platform.os_string()
        ),
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
        accept_language: random_accept_language(),
        // Firefox doesn't send Sec-CH-UA headers
        sec_ch_ua: None,
        sec_ch_ua_platform: None,
    }
}

/// Random profile, weighted roughly by desktop market share.
#[must_use]
pub fn random_profile() -> BrowserProfile {
    let roll: f32 = rand::thread_rng().gen();
    if roll < 0.8 {
        chrome_profile()
    } else {
        firefox_profile()
    }
}

/// Profile with a caller-supplied User-Agent and neutral defaults.
#[must_use]
pub fn fixed_profile(user_agent: &str) -> BrowserProfile {
    BrowserProfile {
        user_agent: user_agent.to_string(),
        accept: "*/*".to_string(),
        accept_language: LANGUAGES[0].to_string(),
        sec_ch_ua: None,
        sec_ch_ua_platform: None,
    }
}

fn random_accept_language() -> String {
    LANGUAGES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("en-US,en;q=0.9")
        .to_string()
}

impl BrowserProfile {
    /// Convert to default request headers. Values that are not valid header
    /// text are skipped.
    pub fn to_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let mut put = |name: HeaderName, value: &str| {
            if let Ok(value) = HeaderValue::from_str(value) {
                headers.insert(name, value);
            }
        };

        put(USER_AGENT, &self.user_agent);
        put(ACCEPT, &self.accept);
        put(ACCEPT_LANGUAGE, &self.accept_language);
        if let Some(ref brands) = self.sec_ch_ua {
            put(HeaderName::from_static("sec-ch-ua"), brands);
            put(HeaderName::from_static("sec-ch-ua-mobile"), "?0");
        }
        if let Some(ref platform) = self.sec_ch_ua_platform {
            put(HeaderName::from_static("sec-ch-ua-platform"), platform);
        }
        // Player pages are loaded as cross-site iframes
        put(HeaderName::from_static("sec-fetch-dest"), "iframe");
        put(HeaderName::from_static("sec-fetch-mode"), "navigate");
        put(HeaderName::from_static("sec-fetch-site"), "cross-site");

        headers
    }
}
