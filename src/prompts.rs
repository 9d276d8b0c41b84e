use crate::models::BookInfo;
use crate::validator::NO_CONTENT_MARKER;

fn insufficient_clause(artifact: &str) -> String {
    format!(
        "If the text is not enough to write a {artifact} (for example it is only front matter, \
         a table of contents, or has no narrative content), respond with exactly: {NO_CONTENT_MARKER}"
    )
}

fn overview(book_summary: &str) -> String {
    if book_summary.trim().is_empty() {
        String::new()
    } else {
        format!("Book overview: {}\n\n", book_summary.trim())
    }
}

pub fn book_summary_prompt(book: &BookInfo, first_chapter: &str) -> String {
    format!(
        "Write a 2-3 sentence summary that makes this book impossible to put down.\n\
         - Vivid and conversational, never formal\n\
         - Capture the central tension or fascination\n\
         - Strong verbs, concrete sensory detail\n\
         - Recommend it the way you would to a friend\n\n\
         Book: {} by {}\n\n\
         Sample text:\n{}\n\n\
         {}\n\
         Otherwise reply with the summary only.",
        book.title,
        book.author,
        first_chapter,
        insufficient_clause("summary")
    )
}

pub fn chapter_prehook_prompt(book: &BookInfo, chapter: &str, book_summary: &str) -> String {
    format!(
        "Write one short, punchy sentence (10-20 words) that makes a reader need this chapter.\n\
         - Pull a specific detail, event or character moment from the text\n\
         - Hint at conflict, tension or mystery\n\
         - Describe what happens here, not the premise of the book\n\n\
         Book: {} by {}\n\n\
         {}Chapter content:\n{}\n\n\
         {}\n\
         Otherwise reply with the sentence only.",
        book.title,
        book.author,
        overview(book_summary),
        chapter,
        insufficient_clause("hook")
    )
}

pub fn chapter_conclusion_prompt(book: &BookInfo, chapter: &str, book_summary: &str) -> String {
    format!(
        "Write a 2-3 sentence conclusion capturing what lingers after this chapter.\n\
         - Name the pivotal moments or revelations\n\
         - Convey their emotional weight\n\
         - Tie them to the larger story and tease what comes next without spoilers\n\
         - Friendly and conversational, not academic\n\n\
         Book: {} by {}\n\n\
         {}Chapter excerpt:\n{}\n\n\
         {}\n\
         Otherwise reply with the conclusion only.",
        book.title,
        book.author,
        overview(book_summary),
        chapter,
        insufficient_clause("conclusion")
    )
}

pub fn segment_teaser_prompt(book: &BookInfo, passage: &str) -> String {
    let context = match (book.title.trim(), book.author.trim()) {
        ("", "") => String::new(),
        (title, "") => format!("Book: {title}\n\n"),
        ("", author) => format!("Book by {author}\n\n"),
        (title, author) => format!("Book: {title} by {author}\n\n"),
    };

    format!(
        "Write a 2-6 word teaser that makes someone curious to read this passage.\n\
         Use vivid verbs, tension or mystery. No punctuation, just the words.\n\n\
         {}Passage:\n{}\n\n\
         {}\n\
         Otherwise reply with the 2-6 words only.",
        context,
        passage,
        insufficient_clause("teaser")
    )
}
