//! Text pattern predicates for layout decisions.
//!
//! The paragraph cascade and the pagination detector lean on a family of
//! regular expressions fitted to financial-report corpora (largely Chinese
//! with mixed English). They classify bullet markers, catalog rows, page
//! numbers, header/footer phrases, captions, and sentence boundaries.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Bullet markers: symbols, (一) / 1. / 1.2.3 style numbering.
    static ref BULLET_SYMBOL: Regex =
        Regex::new(r"^\s*[•●■◆▪♦★☆√□§]+\s*").unwrap();
    static ref BULLET_NUMBERED: Regex =
        Regex::new(r"^\s*[(（]?[\d一二三四五六七八九十]{1,3}[、 ：）)．.]\s*").unwrap();
    static ref BULLET_CN_DOTTED: Regex =
        Regex::new(r"^\s*[(（]?[一二三四五六七八九十]+[.:][^\d]+").unwrap();
    static ref BULLET_SECTION_CN: Regex =
        Regex::new(r"^\s*\d{1,3}[.:]\d{1,3}\s[\u{4E00}-\u{9FA5}]+").unwrap();
    static ref BULLET_DOTTED_PATH: Regex =
        Regex::new(r"^\s*\d{1,3}(\.\d{1,3})+\s*").unwrap();

    // 第X节 / 第X章 section heads.
    static ref CATALOG_PART: Regex =
        Regex::new(r"^第\s?[1-9一二三四五六七八九十]{1,3}\s?[节章]\s*[\d\u{4E00}-\u{9FA5}]+.*").unwrap();

    // Choice rows such as "√ 适用 □ 不适用".
    static ref CHOICE_APPLY: Regex =
        Regex::new(r"√.[\u{4E00}-\u{9FA5}]+.□.[\u{4E00}-\u{9FA5}]+.").unwrap();
    static ref CHOICE_APPLY_REV: Regex =
        Regex::new(r"□.[\u{4E00}-\u{9FA5}]+.√.[\u{4E00}-\u{9FA5}]+.").unwrap();
    static ref CHOICE_SINGLE: Regex = Regex::new(r"^[是否无]$").unwrap();

    // Date lines: 2019年3月5日 and the formal 二〇一九年三月五日.
    static ref DATE_NUMERIC: Regex = Regex::new(r"\d{4}年\d{1,2}月\d{1,2}日").unwrap();
    static ref DATE_FORMAL: Regex = Regex::new(
        r"[\u{4E00}-\u{9FA5}]〇[\u{4E00}-\u{9FA5}]{2}年[\u{4E00}-\u{9FA5}]{1,2}月[\u{4E00}-\u{9FA5}]{1,2}日"
    ).unwrap();

    // Sentence boundaries.
    static ref PARAGRAPH_END: Regex = Regex::new(r"[.。:：;；]\s*$").unwrap();
    static ref SENTENCE_END: Regex = Regex::new(r".+[.。]\s*$").unwrap();
    static ref PARAGRAPH_KEEP: Regex = Regex::new(r"[之第、，]\s*$").unwrap();

    // Catalog (table of contents) rows with dot leaders and page numbers.
    static ref CATALOG_LINE: Regex =
        Regex::new(r"([^\d][.…·]+\s*(-\s)?\d{1,4}(-\s)?)|(\s+\d{1,4})\s*$").unwrap();
    static ref LONG_CATALOG_LINE: Regex = Regex::new(r"^.+[.]{110,}\s*\d+\s*$").unwrap();

    // Page numbers.
    static ref PAGE_NUMBER: Regex = Regex::new(r"^(Page|第|PAGE)?\s*\d+\s*(页)?$").unwrap();
    static ref PAGE_NUMBER_BARE: Regex = Regex::new(r"^[\d\-–/\s]+$").unwrap();

    // Header/footer phrases common in research reports.
    static ref FOOTER_PHRASE: Regex =
        Regex::new(r"(^(敬请|请|资料来源|行业研究|谨请).+|(^[\s\d]+(敬请|请|行业研究|谨请)))").unwrap();
    static ref HEADER_PHRASE: Regex = Regex::new(
        r"((\d+\s*(年|-|.)\d+\s*(月|-|.)(\d+\s*(日|-|.))?\s{2,})|(\s*\S{2,}(报告|報告|周报|周報|日报|日報|年报|年報|月报|月報|早报|早報|研究|策略|晨会|投资|证券|行业|点评)\s*)|(^\s*\S+公司\s*$))"
    ).unwrap();

    // Rows of numbers/labels separated by wide gaps (tables rendered as text).
    static ref DIGIT_LABEL_ROW: Regex =
        Regex::new(r"((\d|-|/|[a-zA-Z]|\.|%)+\s{3,}(\d|-|/|[a-zA-Z]|\.|%)+)+").unwrap();

    // URLs and list-like lines.
    static ref URL: Regex = Regex::new(r"[a-zA-Z]+://\S*").unwrap();
    static ref ADDRESS_LINE: Regex =
        Regex::new(r"[\u{4E00}-\u{9FA5}]{2,10}：[a-zA-Z0-9\u{4E00}-\u{9FA5}]+.*").unwrap();
    static ref COMPANY_CN: Regex = Regex::new(r"^[\u{4E00}-\u{9FA5}]{2,}.*公司").unwrap();
    static ref COMPANY_EN: Regex = Regex::new(r"[a-zA-Z]{2,15}.*Co.*Ltd.").unwrap();
    static ref NOTICE_CN: Regex = Regex::new(r"^[\u{4E00}-\u{9FA5}]+公告").unwrap();
    static ref NOTICE_DATED: Regex =
        Regex::new(r"^[0-9]{4}[\u{4E00}-\u{9FA5}]{2,}.*报告").unwrap();
    static ref LIST_CIRCLED: Regex =
        Regex::new(r"^[\u{4E00}-\u{9FA5}]?[①②③④⑤⑥⑦⑧⑨⑩].[\u{4E00}-\u{9FA5}]+.*").unwrap();
    static ref SERIAL_NUM: Regex = Regex::new(r"^[0-9]{3,}-[0-9]{3,}.*").unwrap();

    // Chart/table captions and data-source credits.
    static ref CAPTION_BEGIN: Regex =
        Regex::new(r"(?i)^\s*(图|表|圖|chart|figure|table)\s*\d*[:：.]?").unwrap();
    static ref SOURCE_CREDIT: Regex =
        Regex::new(r"^\s*(数据来源|资料来源|來源|Source)[:：]?").unwrap();
}

/// Whether the text starts with a bullet or list-numbering marker.
pub fn is_bullet_start(text: &str) -> bool {
    BULLET_SYMBOL.is_match(text)
        || BULLET_NUMBERED.is_match(text)
        || BULLET_CN_DOTTED.is_match(text)
        || BULLET_SECTION_CN.is_match(text)
        || BULLET_DOTTED_PATH.is_match(text)
}

/// Whether the text is a 第X节/第X章 section heading.
pub fn is_catalog_part(text: &str) -> bool {
    CATALOG_PART.is_match(text)
}

/// Whether the text is an apply/not-apply choice row.
pub fn is_choice_symbol(text: &str) -> bool {
    CHOICE_APPLY.is_match(text) || CHOICE_APPLY_REV.is_match(text) || CHOICE_SINGLE.is_match(text)
}

/// Whether the text contains a full date (numeric or formal Chinese).
pub fn is_year_month_day(text: &str) -> bool {
    DATE_NUMERIC.is_match(text) || DATE_FORMAL.is_match(text)
}

/// Whether the text ends a sentence or clause.
pub fn is_paragraph_end(text: &str) -> bool {
    PARAGRAPH_END.is_match(text)
}

/// Whether the text ends with a connective that keeps the paragraph open.
pub fn is_paragraph_keep(text: &str) -> bool {
    PARAGRAPH_KEEP.is_match(text)
}

/// Whether the text looks like a table-of-contents row.
pub fn is_catalog_line(text: &str) -> bool {
    CATALOG_LINE.is_match(text)
}

/// Whether the text is a contents row with a very long dot leader.
pub fn is_long_catalog_line(text: &str) -> bool {
    LONG_CATALOG_LINE.is_match(text)
}

/// Whether the text is a bare page number.
pub fn is_page_number(text: &str) -> bool {
    let t = text.trim();
    !t.is_empty() && (PAGE_NUMBER.is_match(t) || PAGE_NUMBER_BARE.is_match(t))
}

/// Whether the text matches a known footer phrase.
pub fn is_footer_text(text: &str) -> bool {
    FOOTER_PHRASE.is_match(text) || is_page_number(text)
}

/// Whether the text matches a known header phrase.
pub fn is_header_text(text: &str) -> bool {
    HEADER_PHRASE.is_match(text)
}

/// Whether the text is a row of gap-separated numbers/labels.
pub fn is_digit_label_row(text: &str) -> bool {
    let t = text.trim();
    !t.is_empty() && DIGIT_LABEL_ROW.is_match(t)
}

/// Whether the text contains a URL.
pub fn is_url(text: &str) -> bool {
    URL.is_match(text)
}

/// Whether the text is a labeled list line such as "地址：...".
pub fn is_address_line(text: &str) -> bool {
    ADDRESS_LINE.is_match(text)
}

/// Whether the text names a company.
pub fn is_company_title(text: &str) -> bool {
    COMPANY_CN.is_match(text) || COMPANY_EN.is_match(text)
}

/// Whether the text is an announcement/report title.
pub fn is_notice_title(text: &str) -> bool {
    NOTICE_CN.is_match(text) || NOTICE_DATED.is_match(text)
}

/// Whether the text starts with a circled list number.
pub fn is_list_start(text: &str) -> bool {
    LIST_CIRCLED.is_match(text)
}

/// Whether the text starts with a long hyphenated serial number.
pub fn is_serial_number(text: &str) -> bool {
    SERIAL_NUM.is_match(text)
}

/// Whether the text begins a chart/table caption.
pub fn is_caption_begin(text: &str) -> bool {
    CAPTION_BEGIN.is_match(text.trim_start())
}

/// Whether the text is a data-source credit line.
pub fn is_source_credit(text: &str) -> bool {
    SOURCE_CREDIT.is_match(text.trim_start())
}

/// Whether a character is a CJK ideograph.
pub fn is_cjk_char(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
        || ('\u{3400}'..='\u{4DBF}').contains(&c)
        || ('\u{F900}'..='\u{FAFF}').contains(&c)
        || ('\u{3000}'..='\u{303F}').contains(&c)
        || ('\u{FF00}'..='\u{FFEF}').contains(&c)
}

/// Count of non-blank CJK ideographs in the text.
pub fn cjk_char_count(text: &str) -> usize {
    text.chars()
        .filter(|c| !c.is_whitespace() && is_cjk_char(*c))
        .count()
}

/// Whether the text ends with a hard sentence terminator (full stop only).
pub fn is_sentence_end(text: &str) -> bool {
    SENTENCE_END.is_match(text)
}

/// Whether the text contains a clause-level comma.
pub fn has_comma(text: &str) -> bool {
    text.contains('，') || text.contains(',') || text.contains('、')
}

/// Count of wide gaps (three or more spaces between non-space text) in the
/// text. Tables rendered as plain text show up as lines with such gaps.
pub fn space_gap_count(text: &str) -> usize {
    let trimmed = text.trim();
    let mut gaps = 0;
    let mut run = 0usize;
    let mut seen_text = false;
    for c in trimmed.chars() {
        if c == ' ' || c == '\u{3000}' {
            run += 1;
        } else {
            if seen_text && run >= 3 {
                gaps += 1;
            }
            run = 0;
            seen_text = true;
        }
    }
    gaps
}

/// Number of gap-separated columns the text visually splits into.
pub fn column_count(text: &str) -> usize {
    if text.trim().is_empty() {
        0
    } else {
        space_gap_count(text) + 1
    }
}

/// Whether the text is predominantly Latin-script words.
pub fn is_latin_text(text: &str) -> bool {
    let visible: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    if visible.is_empty() {
        return false;
    }
    let latin = visible
        .iter()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_ascii_punctuation())
        .count();
    latin * 10 >= visible.len() * 7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullet_start() {
        assert!(is_bullet_start("● 第一项"));
        assert!(is_bullet_start("（一）公司简介"));
        assert!(is_bullet_start("1. Overview"));
        assert!(is_bullet_start("3.1.2 经营情况"));
        assert!(!is_bullet_start("公司全年收入增长"));
    }

    #[test]
    fn test_paragraph_end() {
        assert!(is_paragraph_end("本年度业绩良好。"));
        assert!(is_paragraph_end("as follows:"));
        assert!(!is_paragraph_end("收入较上年增长，"));
        assert!(is_paragraph_keep("收入较上年增长，"));
    }

    #[test]
    fn test_page_number() {
        assert!(is_page_number("第 12 页"));
        assert!(is_page_number("Page 3"));
        assert!(is_page_number("3 - 4"));
        assert!(!is_page_number("第一章 总则"));
    }

    #[test]
    fn test_header_footer_text() {
        assert!(is_header_text("2019年行业研究报告"));
        assert!(is_footer_text("敬请参阅最后一页免责声明"));
        assert!(!is_footer_text("公司主营业务"));
    }

    #[test]
    fn test_caption_and_credit() {
        assert!(is_caption_begin("图 3：收入结构"));
        assert!(is_caption_begin("Table 2. Results"));
        assert!(is_source_credit("资料来源：公司公告"));
        assert!(!is_caption_begin("经营图景良好"));
    }

    #[test]
    fn test_catalog_line() {
        assert!(is_catalog_line("第一章 总则........12"));
        assert!(is_choice_symbol("√ 适用 □ 不适用"));
    }

    #[test]
    fn test_cjk_count() {
        assert_eq!(cjk_char_count("收入 123 增长"), 4);
        assert_eq!(cjk_char_count("abc 123"), 0);
    }

    #[test]
    fn test_dates_and_urls() {
        assert!(is_year_month_day("2020年12月31日"));
        assert!(is_url("详见 http://example.com/report"));
        assert!(is_address_line("地址：北京市海淀区1号"));
    }
}
