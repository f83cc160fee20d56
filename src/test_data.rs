#[cfg(test)]
pub const CHANNEL_JSON: &str = r##"{
  "title": "Field notes",
  "length": 6,
  "updated_at": "2024-03-05T12:00:00.000Z",
  "contents": [
    {
      "id": 101,
      "title": "Hello, World!",
      "content": "headline: Greeting\nThis is **bold**.",
      "description": "pin: top\ntags: sky, water\nSome text here.",
      "class": "Text",
      "created_at": "2024-03-01T10:00:00.000Z",
      "updated_at": "2024-03-05T12:00:00.000Z"
    },
    {
      "id": 102,
      "title": "Sunset",
      "content": "",
      "description": "colour: #ffeecc\nborder: red\nTaken from the pier.",
      "class": "Image",
      "image": {
        "display": { "url": "https://images.example.com/sunset-display.jpg" },
        "large": { "url": "https://images.example.com/sunset-large.jpg" },
        "original": { "url": "https://images.example.com/sunset.jpg" }
      },
      "created_at": "2024-02-20T08:30:00.000Z",
      "updated_at": "2024-02-21T08:30:00.000Z"
    },
    {
      "id": 103,
      "title": "",
      "content": "A language empowering everyone.",
      "description": "author: Ada Lovelace\nAn essay on *repair*.",
      "class": "Link",
      "source": { "url": "https://www.rust-lang.org", "title": "Rust" },
      "image": { "display": { "url": "https://images.example.com/rust-preview.png" } },
      "created_at": "2024-02-10T09:00:00.000Z",
      "updated_at": "2024-03-01T09:00:00.000Z"
    },
    {
      "id": 104,
      "title": "Field guide",
      "class": "Attachment",
      "attachment": {
        "url": "https://files.example.com/guide.pdf",
        "file_name": "guide.pdf",
        "content_type": "application/pdf"
      },
      "created_at": "2024-01-15T00:00:00.000Z",
      "updated_at": "2024-01-15T00:00:00.000Z"
    },
    {
      "id": 105,
      "title": "Notes",
      "class": "Media",
      "embed": { "html": "<iframe src=\"https://player.example.com/1\"></iframe>" },
      "created_at": "2024-01-10T00:00:00.000Z",
      "updated_at": "2024-01-10T00:00:00.000Z"
    },
    {
      "id": 106,
      "title": null,
      "content": null,
      "class": "Channel",
      "created_at": "2024-01-01T00:00:00.000Z",
      "updated_at": "2024-01-01T00:00:00.000Z"
    }
  ]
}"##;

#[cfg(test)]
pub const LAYOUT_TPL: &str = r##"<html><head><title>{{ title }}</title></head><body><header>{{ channel_title }}</header><ul>{{ nav }}</ul><main>{{ content }}</main><footer>{{ updated }} <span data-page-size>?</span></footer></body></html>"##;

#[cfg(test)]
pub const HOME_TPL: &str = r##"<h1>{{ channel_title }}</h1><div class="blocks">{{ blocks }}</div>"##;

#[cfg(test)]
pub const ITEM_TPL: &str = r##"<article class="item item-{{ class }}{{ pinned_class }}"{{ style }}><h1>{{ title }}</h1>{{ content }}{{ description }}<time>{{ created }}</time><time>{{ updated }}</time></article>"##;

#[cfg(test)]
pub const NOT_FOUND_TPL: &str = r##"<h1>Not found</h1>"##;

#[cfg(test)]
pub fn channel() -> crate::channel::Channel {
    serde_json::from_str(CHANNEL_JSON).unwrap()
}

#[cfg(test)]
pub fn templates() -> crate::template::Templates {
    crate::template::Templates {
        layout: LAYOUT_TPL.to_string(),
        home: HOME_TPL.to_string(),
        item: ITEM_TPL.to_string(),
        not_found: NOT_FOUND_TPL.to_string(),
    }
}

#[cfg(test)]
pub fn write_templates(dir: &std::path::Path) {
    std::fs::write(dir.join("layout.html"), LAYOUT_TPL).unwrap();
    std::fs::write(dir.join("home.html"), HOME_TPL).unwrap();
    std::fs::write(dir.join("item.html"), ITEM_TPL).unwrap();
    std::fs::write(dir.join("404.html"), NOT_FOUND_TPL).unwrap();
}

#[cfg(test)]
pub fn config(output_dir: &std::path::Path) -> crate::config::Config {
    use crate::config::{Api, Build, Config, Paths, Poll};

    Config {
        channel: "field-notes".to_string(),
        token: "secret".to_string(),
        api: Api { api_base: "https://api.example.com/v2/".to_string(), per_page: 50 },
        output_dir: output_dir.to_path_buf(),
        paths: Paths::default(),
        build: Build::default(),
        log: None,
        rss_feed: None,
        poll: Poll::default(),
        poll_interval: std::time::Duration::from_secs(300),
    }
}
