//! Built-in HTML pages.

use std::fmt::Write;

use crate::config::Config;
use crate::expiration::Policy;
use crate::store::Paste;

/// Escapes text for HTML element content and quoted attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(config: &Config, title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} · tsubin</title>\n</head>\n<body>\n\
         <header><a href=\"/new/\">tsubin</a></header>\n\
         <main>\n{body}\n</main>\n\
         <footer>tsubin {version}</footer>\n</body>\n</html>\n",
        title = escape(title),
        version = escape(&config.version),
    )
}

/// Creation form. Submits via `fetch` and follows the returned id.
pub fn new_paste(config: &Config) -> String {
    let mut options = String::new();
    for policy in Policy::ALL {
        let selected = if policy == Policy::OneDay { " selected" } else { "" };
        let _ = writeln!(options, "<option value=\"{}\"{selected}>{}</option>", policy.name(), policy.label());
    }

    let body = format!(
        r#"<form id="new" method="post" action="/paste/create">
<textarea name="content" rows="20" cols="80" maxlength="{max}" required></textarea>
<label>Expires <select name="expiration">
{options}</select></label>
<button type="submit">Create</button>
<p id="error" hidden></p>
</form>
<script>
document.getElementById("new").addEventListener("submit", async (ev) => {{
  ev.preventDefault();
  const res = await fetch("/paste/create", {{ method: "POST", body: new URLSearchParams(new FormData(ev.target)) }});
  const reply = await res.json();
  if (reply.status === "ok") {{ location.href = "/paste/" + reply.paste; return; }}
  const err = document.getElementById("error");
  err.textContent = reply.message;
  err.hidden = false;
}});
</script>"#,
        max = config.max_size,
    );
    layout(config, "New paste", &body)
}

pub fn paste(config: &Config, paste: &Paste) -> String {
    let notice = if paste.burn_after_reading && paste.keep_alive {
        "<p class=\"notice\">Burn after reading: this paste is deleted once it is viewed.</p>".to_owned()
    } else if paste.burn_after_reading {
        "<p class=\"notice\">This paste has been burned. Copy it now; reloading will not bring it back.</p>".to_owned()
    } else {
        match &paste.expiration {
            Some(when) => format!("<p class=\"notice\">Expires {}.</p>", escape(when)),
            None => String::new(),
        }
    };
    let body = format!("{notice}\n<pre>{}</pre>", escape(&paste.content_lossy()));
    layout(config, &paste.id, &body)
}

pub fn not_found(config: &Config) -> String {
    layout(config, "Not found", "<h1>Paste not found</h1>\n<p>It may never have existed, or it has expired.</p>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn form_lists_every_policy() {
        let html = new_paste(&Config::default());
        for policy in Policy::ALL {
            assert!(html.contains(&format!("value=\"{}\"", policy.name())));
        }
    }
}
