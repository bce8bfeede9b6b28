//! Static mapping from YouTube video category ids to display names.

const CATEGORIES: &[(u32, &str)] = &[
    (1, "Film & Animation"),
    (2, "Autos & Vehicles"),
    (10, "Music"),
    (15, "Pets & Animals"),
    (17, "Sports"),
    (18, "Short Movies"),
    (19, "Travel & Events"),
    (20, "Gaming"),
    (21, "Videoblogging"),
    (22, "People & Blogs"),
    (23, "Comedy"),
    (24, "Entertainment"),
    (25, "News & Politics"),
    (26, "Howto & Style"),
    (27, "Education"),
    (28, "Science & Technology"),
    (29, "Nonprofits & Activism"),
    (30, "Movies"),
    (31, "Anime/Animation"),
    (32, "Action/Adventure"),
    (33, "Classics"),
    (34, "Comedy"),
    (35, "Documentary"),
    (36, "Drama"),
    (37, "Family"),
    (38, "Foreign"),
    (39, "Horror"),
    (40, "Sci-Fi/Fantasy"),
    (41, "Thriller"),
    (42, "Shorts"),
    (43, "Shows"),
    (44, "Trailers"),
];

pub fn category_name(id: u32) -> Option<&'static str> {
    CATEGORIES
        .binary_search_by_key(&id, |(k, _)| *k)
        .ok()
        .map(|i| CATEGORIES[i].1)
}

/// Same as [`category_name`] for the string ids found in API responses and CSVs.
pub fn category_name_str(id: &str) -> Option<&'static str> {
    id.trim().parse().ok().and_then(category_name)
}

pub fn all() -> &'static [(u32, &'static str)] {
    CATEGORIES
}
