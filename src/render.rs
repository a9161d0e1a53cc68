//! HTML fragments for the board, guestbook and remote board pages
//!
//! Every function is a pure function of the data, whether the viewer holds
//! an admin session, and the current time. Views are fully re-rendered after
//! each change.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::models::{Comment, Message, Post, RemotePost};

/// Relative description of `created` as seen at `now`
pub fn format_relative_date(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = (now - created).max(chrono::Duration::zero());

    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 2 {
        "yesterday".to_string()
    } else if days <= 7 {
        plural(days, "day")
    } else {
        created.format("%B %-d, %Y").to_string()
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Plain text with line breaks kept
fn text_block(s: &str) -> String {
    escape_html(s).replace('\n', "<br>")
}

fn empty_state(heading: &str, hint: &str) -> String {
    format!(
        r#"<div class="empty-state"><h3>{}</h3><p>{}</p></div>"#,
        heading, hint
    )
}

fn delete_button(action: &str, attrs: &str) -> String {
    format!(
        r#"<button class="delete-btn" data-action="{}" {} title="Delete">Delete</button>"#,
        action, attrs
    )
}

fn count_label(n: usize, singular: &str) -> String {
    if n == 1 {
        format!("1 {}", singular)
    } else {
        format!("{} {}s", n, singular)
    }
}

/// Post list of a board, newest first
pub fn render_board(board: &str, posts: &[Post], is_admin: bool, now: DateTime<Utc>) -> String {
    let mut html = format!(
        r#"<div class="post-count" data-board="{}">{}</div>"#,
        escape_html(board),
        count_label(posts.len(), "post")
    );

    if posts.is_empty() {
        html.push_str(&empty_state("No posts yet", "Be the first to write one!"));
        return html;
    }

    let mut sorted: Vec<&Post> = posts.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    html.push_str(r#"<div class="post-list">"#);
    for post in sorted {
        let _ = write!(
            html,
            r#"<div class="post-item" data-post-id="{id}"><div class="post-info"><div class="post-title">{title}</div><div class="post-meta"><span>By {author}</span><span>{date}</span></div></div><div class="post-stats"><span>{comments}</span></div>"#,
            id = post.id,
            title = escape_html(&post.title),
            author = escape_html(&post.author),
            date = format_relative_date(post.created_at, now),
            comments = count_label(post.comment_count(), "comment"),
        );
        if is_admin {
            html.push_str(&delete_button(
                "delete-post",
                &format!(r#"data-post-id="{}""#, post.id),
            ));
        }
        html.push_str("</div>");
    }
    html.push_str("</div>");
    html
}

/// Comments under a post, in the order written
pub fn render_comments(post_id: i64, comments: &[Comment], is_admin: bool, now: DateTime<Utc>) -> String {
    if comments.is_empty() {
        return r#"<p class="comments-empty">No comments yet. Be the first to leave one!</p>"#
            .to_string();
    }

    let mut html = String::new();
    for comment in comments {
        let _ = write!(
            html,
            r#"<div class="comment-item" data-comment-id="{id}"><div class="comment-author">{author}</div><div class="comment-content">{content}</div><div class="comment-date">{date}</div>"#,
            id = comment.id,
            author = escape_html(&comment.author),
            content = text_block(&comment.content),
            date = format_relative_date(comment.created_at, now),
        );
        if is_admin {
            html.push_str(&delete_button(
                "delete-comment",
                &format!(
                    r#"data-post-id="{}" data-comment-id="{}""#,
                    post_id, comment.id
                ),
            ));
        }
        html.push_str("</div>");
    }
    html
}

/// One post with its comments
pub fn render_post_detail(post: &Post, is_admin: bool, now: DateTime<Utc>) -> String {
    let mut html = format!(
        r#"<article class="post-detail" data-post-id="{id}"><h2 class="post-title">{title}</h2><div class="post-meta"><span>By {author}</span><span>{date}</span></div><div class="post-content">{content}</div>"#,
        id = post.id,
        title = escape_html(&post.title),
        author = escape_html(&post.author),
        date = format_relative_date(post.created_at, now),
        content = text_block(&post.content),
    );
    if is_admin {
        html.push_str(&delete_button(
            "delete-post",
            &format!(r#"data-post-id="{}""#, post.id),
        ));
    }
    let _ = write!(
        html,
        r#"<section class="comments"><h3>{}</h3>{}</section></article>"#,
        count_label(post.comment_count(), "comment"),
        render_comments(post.id, &post.comments, is_admin, now)
    );
    html
}

/// Guestbook messages in stored order (newest first)
pub fn render_guestbook(messages: &[Message], is_admin: bool, now: DateTime<Utc>) -> String {
    let mut html = format!(
        r#"<div class="message-count">{}</div>"#,
        count_label(messages.len(), "message")
    );

    if messages.is_empty() {
        html.push_str(&empty_state("No messages yet", "Leave the first message!"));
        return html;
    }

    for msg in messages {
        let _ = write!(
            html,
            r#"<div class="message-card" data-message-id="{id}"><div class="message-header"><div class="message-author">{author}</div><div class="message-date">{date}</div></div><div class="message-content">{message}</div>"#,
            id = msg.id,
            author = escape_html(&msg.author),
            date = format_relative_date(msg.created_at, now),
            message = escape_html(&msg.message),
        );
        if is_admin {
            html.push_str(&delete_button(
                "delete-message",
                &format!(r#"data-message-id="{}""#, msg.id),
            ));
        }
        html.push_str("</div>");
    }
    html
}

/// Issue-backed post list; posts arrive newest first from the tracker
pub fn render_remote_board(
    board: &str,
    posts: &[RemotePost],
    is_admin: bool,
    now: DateTime<Utc>,
) -> String {
    let mut html = format!(
        r#"<div class="post-count" data-board="{}">{}</div>"#,
        escape_html(board),
        count_label(posts.len(), "post")
    );

    if posts.is_empty() {
        html.push_str(&empty_state("No posts yet", "Posts written here are stored as GitHub issues."));
        return html;
    }

    html.push_str(r#"<div class="post-list">"#);
    for post in posts {
        let _ = write!(
            html,
            r#"<div class="post-item" data-post-id="{id}"><div class="post-info"><div class="post-title">{title}</div><div class="post-meta"><span>By {author}</span><span>{date}</span></div></div><div class="post-stats"><span>{comments}</span><a href="{url}" target="_blank" rel="noopener">View on GitHub</a></div>"#,
            id = post.id,
            title = escape_html(&post.title),
            author = escape_html(&post.author),
            date = format_relative_date(post.created_at, now),
            comments = count_label(post.comments as usize, "comment"),
            url = escape_html(&post.url),
        );
        if is_admin {
            html.push_str(&delete_button(
                "delete-remote-post",
                &format!(r#"data-post-id="{}""#, post.id),
            ));
        }
        html.push_str("</div>");
    }
    html.push_str("</div>");
    html
}

/// One remote post; the body is admin-authored rich HTML and is emitted as is
pub fn render_remote_post(post: &RemotePost, is_admin: bool, now: DateTime<Utc>) -> String {
    let mut html = format!(
        r#"<article class="post-detail" data-post-id="{id}"><h2 class="post-title">{title}</h2><div class="post-meta"><span>By {author}</span><span>{date}</span></div><div class="post-content rich">{content}</div><a class="issue-link" href="{url}" target="_blank" rel="noopener">Comment on GitHub ({comments})</a>"#,
        id = post.id,
        title = escape_html(&post.title),
        author = escape_html(&post.author),
        date = format_relative_date(post.created_at, now),
        content = post.content,
        url = escape_html(&post.url),
        comments = post.comments,
    );
    if is_admin {
        html.push_str(&delete_button(
            "delete-remote-post",
            &format!(r#"data-post-id="{}""#, post.id),
        ));
    }
    html.push_str("</article>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn post(id: i64, title: &str, created_at: DateTime<Utc>) -> Post {
        Post {
            id,
            title: title.to_string(),
            author: "Yang".to_string(),
            content: "line one\nline two".to_string(),
            created_at,
            comments: Vec::new(),
        }
    }

    #[test]
    fn test_relative_dates() {
        let now = now();
        assert_eq!(format_relative_date(now - Duration::seconds(30), now), "just now");
        assert_eq!(format_relative_date(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(format_relative_date(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(format_relative_date(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(format_relative_date(now - Duration::hours(30), now), "yesterday");
        assert_eq!(format_relative_date(now - Duration::days(7), now), "7 days ago");
        assert_eq!(format_relative_date(now - Duration::days(30), now), "February 14, 2024");
        // Clock skew never yields a negative age
        assert_eq!(format_relative_date(now + Duration::minutes(5), now), "just now");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#39;y&#39;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_board_empty_state() {
        let html = render_board("cs", &[], true, now());
        assert!(html.contains("0 posts"));
        assert!(html.contains("empty-state"));
        assert!(!html.contains("post-item"));
    }

    #[test]
    fn test_board_newest_first_and_escaped() {
        let now = now();
        let posts = vec![
            post(1, "older", now - Duration::days(2)),
            post(2, "<b>newer</b>", now - Duration::minutes(2)),
        ];
        let html = render_board("cs", &posts, false, now);

        assert!(html.contains("2 posts"));
        let newer = html.find("&lt;b&gt;newer&lt;/b&gt;").unwrap();
        let older = html.find("older").unwrap();
        assert!(newer < older);
        assert!(!html.contains("<b>newer</b>"));
    }

    #[test]
    fn test_delete_buttons_only_for_admin() {
        let now = now();
        let mut p = post(7, "t", now);
        p.comments.push(Comment {
            id: 8,
            author: "Kim".to_string(),
            content: "hi".to_string(),
            created_at: now,
        });
        let messages = vec![Message {
            id: 9,
            author: "Lee".to_string(),
            message: "hello".to_string(),
            created_at: now,
        }];

        for (anon, admin) in [
            (render_board("cs", &[p.clone()], false, now), render_board("cs", &[p.clone()], true, now)),
            (render_post_detail(&p, false, now), render_post_detail(&p, true, now)),
            (render_guestbook(&messages, false, now), render_guestbook(&messages, true, now)),
        ] {
            assert!(!anon.contains("delete-btn"));
            assert!(admin.contains("delete-btn"));
        }
        assert!(render_post_detail(&p, true, now).contains(r#"data-comment-id="8""#));
    }

    #[test]
    fn test_post_detail_comments_empty_state() {
        let now = now();
        let html = render_post_detail(&post(1, "t", now), false, now);
        assert!(html.contains("No comments yet"));
        assert!(html.contains("line one<br>line two"));
    }

    #[test]
    fn test_guestbook_count_and_empty() {
        let html = render_guestbook(&[], false, now());
        assert!(html.contains("0 messages"));
        assert!(html.contains("empty-state"));
    }

    #[test]
    fn test_remote_content_is_not_escaped() {
        let now = now();
        let post = RemotePost {
            id: 3,
            title: "<i>t</i>".to_string(),
            content: "Author: Yang\n\n<p><strong>rich</strong></p>".to_string(),
            author: "Yang".to_string(),
            created_at: now,
            comments: 2,
            url: "https://github.com/o/r/issues/3".to_string(),
        };

        let detail = render_remote_post(&post, false, now);
        assert!(detail.contains("<p><strong>rich</strong></p>"));
        assert!(detail.contains("&lt;i&gt;t&lt;/i&gt;"));
        assert!(detail.contains("https://github.com/o/r/issues/3"));
        assert!(!detail.contains("delete-btn"));

        let list = render_remote_board("cs", &[post], true, now);
        assert!(list.contains("2 comments"));
        assert!(list.contains("delete-btn"));
    }
}
