//! Offline descriptions used when no model answer is available.

use crate::services::route_planner::diversity::stable_hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Cafe,
    Park,
    Museum,
    View,
    Generic,
}

impl Topic {
    /// Pick a topic from the interests and the place name together.
    pub fn detect(interests: &str, name: &str) -> Self {
        let text = format!("{} {}", interests, name).to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

        if has(&["кафе", "кофе", "cafe", "coffee"]) {
            Topic::Cafe
        } else if has(&["парк", "сквер", "park", "garden"]) {
            Topic::Park
        } else if has(&["музе", "museum", "галере", "gallery"]) {
            Topic::Museum
        } else if has(&["вид", "панорам", "обзор", "viewpoint", "lookout", "view"]) {
            Topic::View
        } else {
            Topic::Generic
        }
    }
}

const RU_CAFE: &[&str] = &[
    "{name}: небольшая кофейня, где можно взять эспрессо или капучино и немного выпечки.",
    "{name}: спокойное место для короткого кофейного перерыва между точками маршрута.",
    "{name}: простое меню напитков и десертов, хватит пятнадцати минут.",
    "{name}: возьмите напиток с собой и продолжайте прогулку.",
];

const RU_PARK: &[&str] = &[
    "{name}: зелёная зона с аллеями и скамейками для передышки.",
    "{name}: компактный сквер, удобный для короткой остановки.",
    "{name}: тихое место для небольшого круга и пары фотографий.",
    "{name}: открытое пространство, где можно задержаться на десять минут.",
];

const RU_MUSEUM: &[&str] = &[
    "{name}: небольшая экспозиция, которую можно осмотреть без спешки за полчаса.",
    "{name}: загляните в основной зал и двигайтесь дальше по маршруту.",
    "{name}: местная коллекция; достаточно посмотреть главное.",
    "{name}: короткая культурная пауза на маршруте.",
];

const RU_VIEW: &[&str] = &[
    "{name}: точка с широким обзором, удобная для фотографий.",
    "{name}: смотровое место; задержитесь ради вида.",
    "{name}: открытая панорама, подходящая для короткой фотопаузы.",
    "{name}: обзорная площадка, пяти минут будет достаточно.",
];

const RU_GENERIC: &[&str] = &[
    "{name}: интересная точка по теме прогулки.",
    "{name}: место по выбранной теме, удобная пауза перед следующим пунктом.",
    "{name}: неприметная, но уместная остановка на пути.",
    "{name}: логичная остановка по дороге к следующей локации.",
];

const EN_CAFE: &[&str] = &[
    "{name}: a small coffee spot for an espresso and a pastry on the way.",
    "{name}: a calm place for a short coffee break between stops.",
    "{name}: a simple menu of drinks and desserts; fifteen minutes is plenty.",
    "{name}: grab a drink to go and keep walking.",
];

const EN_PARK: &[&str] = &[
    "{name}: a green area with paths and benches for a breather.",
    "{name}: a compact square that suits a short stop.",
    "{name}: a quiet loop with a couple of good photo angles.",
    "{name}: open space where ten minutes of rest fit the plan.",
];

const EN_MUSEUM: &[&str] = &[
    "{name}: a small exhibition you can see in half an hour.",
    "{name}: look into the main hall and move on along the route.",
    "{name}: a local collection; the highlights are enough.",
    "{name}: a short cultural pause on the walk.",
];

const EN_VIEW: &[&str] = &[
    "{name}: a wide view that is good for photos.",
    "{name}: a lookout worth a short stop.",
    "{name}: an open panorama for a quick photo break.",
    "{name}: a viewing spot; five minutes will do.",
];

const EN_GENERIC: &[&str] = &[
    "{name}: an interesting stop on the theme of the walk.",
    "{name}: a place on your chosen theme and a pause before the next point.",
    "{name}: an unassuming but fitting stop along the way.",
    "{name}: a natural stop on the way to the next location.",
];

fn templates(topic: Topic, locale: &str) -> &'static [&'static str] {
    let russian = locale.trim().eq_ignore_ascii_case("ru");
    match (topic, russian) {
        (Topic::Cafe, true) => RU_CAFE,
        (Topic::Park, true) => RU_PARK,
        (Topic::Museum, true) => RU_MUSEUM,
        (Topic::View, true) => RU_VIEW,
        (Topic::Generic, true) => RU_GENERIC,
        (Topic::Cafe, false) => EN_CAFE,
        (Topic::Park, false) => EN_PARK,
        (Topic::Museum, false) => EN_MUSEUM,
        (Topic::View, false) => EN_VIEW,
        (Topic::Generic, false) => EN_GENERIC,
    }
}

/// Template description for `name`; the variant is chosen from a hash of the
/// name so the same place always reads the same.
pub fn fallback_description(name: &str, interests: &str, locale: &str) -> String {
    let options = templates(Topic::detect(interests, name), locale);
    let idx = (stable_hash(name) % options.len() as u64) as usize;
    let name = if name.trim().is_empty() {
        if locale.trim().eq_ignore_ascii_case("ru") {
            "Локация"
        } else {
            "Location"
        }
    } else {
        name.trim()
    };
    options[idx].replace("{name}", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_detection() {
        assert_eq!(Topic::detect("кофе", "Anything"), Topic::Cafe);
        assert_eq!(Topic::detect("история", "Александровский сад сквер"), Topic::Park);
        assert_eq!(Topic::detect("museums", "Kremlin"), Topic::Museum);
        assert_eq!(Topic::detect("панорамы", "Стрелка"), Topic::View);
        assert_eq!(Topic::detect("history", "Kremlin"), Topic::Generic);
    }

    #[test]
    fn test_fallback_is_deterministic_and_named() {
        let a = fallback_description("Chkalov Stairs", "views", "en");
        let b = fallback_description("Chkalov Stairs", "views", "en");
        assert_eq!(a, b);
        assert!(a.starts_with("Chkalov Stairs: "));
        assert!(EN_VIEW
            .iter()
            .any(|t| t.replace("{name}", "Chkalov Stairs") == a));
    }

    #[test]
    fn test_fallback_follows_locale() {
        let ru = fallback_description("Кремль", "музеи", "ru");
        assert!(RU_MUSEUM.iter().any(|t| t.replace("{name}", "Кремль") == ru));

        let en = fallback_description("Kremlin", "museums", "EN");
        assert!(EN_MUSEUM.iter().any(|t| t.replace("{name}", "Kremlin") == en));
    }

    #[test]
    fn test_blank_name_gets_placeholder() {
        assert!(fallback_description("  ", "парки", "ru").starts_with("Локация: "));
    }
}
