use std::path::{Path, PathBuf};

/// Movie-review style training lines, `text<TAB>label`.
pub const MOVIE_REVIEWS: &[(&str, u8)] = &[
    ("A very, very, very slow-moving, aimless movie about a distressed, drifting young man.", 0),
    ("Not sure who was more lost - the flat characters or the audience.", 0),
    ("Attempting artiness with black & white and clever camera angles, the movie disappointed.", 0),
    ("Very little music or anything to speak of.", 0),
    ("The best scene in the movie was when Gerardo is trying to find a song.", 1),
    ("The rest of the movie lacks art, charm, meaning.", 0),
    ("Wasted two hours.", 0),
    ("Saw the movie today and thought it was a good effort, good messages for kids.", 1),
    ("A bit predictable.", 0),
    ("Loved the casting of Jimmy Buffet, a perfect choice.", 1),
    ("And those baby owls were adorable.", 1),
    ("The movie showed a lot of Florida at its best, made it look very appealing.", 1),
    ("The Songs Were The Best And The Muppets Were So Hilarious.", 1),
    ("It Was So Cool.", 1),
    ("This is a very bad film, the acting is terrible.", 0),
    ("A great film with a wonderful cast.", 1),
    ("The acting was bad and the plot was worse.", 0),
    ("What a wonderful, great experience this movie was.", 1),
    ("Terrible direction, bad dialogue, awful pacing.", 0),
    ("I loved every minute, a truly great movie.", 1),
];

/// Restaurant-review style held-out lines.
pub const RESTAURANT_REVIEWS: &[(&str, u8)] = &[
    ("Wow... Loved this place.", 1),
    ("Crust is not good.", 0),
    ("Not tasty and the texture was just nasty.", 0),
    ("The selection on the menu was great and so were the prices.", 1),
    ("Honeslty it didn't taste THAT fresh.", 0),
    ("The potatoes were like rubber and you could tell they had been made up ahead of time.", 0),
    ("The fries were great too.", 1),
    ("A great touch.", 1),
    ("Service was very bad and the food was terrible.", 0),
    ("A wonderful experience, we loved it.", 1),
];

pub fn write_tsv(dir: &Path, name: &str, rows: &[(&str, u8)]) -> PathBuf {
    let path = dir.join(name);
    let body: String = rows
        .iter()
        .map(|(text, label)| format!("{text}\t{label}\n"))
        .collect();
    std::fs::write(&path, body).expect("write fixture");
    path
}
