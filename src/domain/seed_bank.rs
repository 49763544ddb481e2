//! Hand-authored questions used before adaptive generation is available or affordable.
//!
//! Days 1-10 each have one canonical set. Every seed question (day sets plus the
//! reserve below) also forms the pool for the per-member unique shuffle used once the
//! canonical days are exhausted and no AI is available.

use crate::domain::models::{
    DriverKey, Language, NewTemplate, Polarity, QuestionDraft, QuestionType, TemplateSource,
    REQUIRED_QUESTION_COUNT,
};
use crate::domain::shuffle::{seeded_shuffle, shuffle_key};
use crate::domain::titles::title_hash;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use uuid::Uuid;

pub const SEED_DAYS: i32 = 10;

const NO_CHOICES: &[&str] = &[];

#[derive(Debug, Clone, Copy)]
pub struct SeedQuestion {
    pub qtype: QuestionType,
    pub driver: DriverKey,
    pub polarity: Polarity,
    pub scale: Option<(i32, i32)>,
    pub en: &'static str,
    pub uk: &'static str,
    pub choices_en: &'static [&'static str],
    pub choices_uk: &'static [&'static str],
}

/// 0-10 self-rating of overall stress.
const fn overall(polarity: Polarity, en: &'static str, uk: &'static str) -> SeedQuestion {
    SeedQuestion {
        qtype: QuestionType::Scale,
        driver: DriverKey::Overall,
        polarity,
        scale: Some((0, 10)),
        en,
        uk,
        choices_en: NO_CHOICES,
        choices_uk: NO_CHOICES,
    }
}

/// 1-5 agreement with a statement about one driver.
const fn agree(
    driver: DriverKey,
    polarity: Polarity,
    en: &'static str,
    uk: &'static str,
) -> SeedQuestion {
    SeedQuestion {
        qtype: QuestionType::Scale,
        driver,
        polarity,
        scale: Some((1, 5)),
        en,
        uk,
        choices_en: NO_CHOICES,
        choices_uk: NO_CHOICES,
    }
}

const fn open(en: &'static str, uk: &'static str) -> SeedQuestion {
    SeedQuestion {
        qtype: QuestionType::Text,
        driver: DriverKey::Unknown,
        polarity: Polarity::Negative,
        scale: None,
        en,
        uk,
        choices_en: NO_CHOICES,
        choices_uk: NO_CHOICES,
    }
}

const fn pick_one(
    en: &'static str,
    uk: &'static str,
    choices_en: &'static [&'static str],
    choices_uk: &'static [&'static str],
) -> SeedQuestion {
    SeedQuestion {
        qtype: QuestionType::SingleChoice,
        driver: DriverKey::Unknown,
        polarity: Polarity::Negative,
        scale: None,
        en,
        uk,
        choices_en,
        choices_uk,
    }
}

use DriverKey::{Autonomy, Balance, Clarity, Growth, Meetings, Recognition, Support, Workload};
use Polarity::{Negative as NEG, Positive as POS};

static DAYS: [[SeedQuestion; 6]; 10] = [
    [
        overall(NEG, "Overall, how stressed do you feel today?", "Наскільки ти загалом відчуваєш стрес сьогодні?"),
        agree(Workload, NEG, "My workload today feels heavier than I can handle.", "Моє навантаження сьогодні більше, ніж я можу впоратися."),
        agree(Clarity, POS, "I know exactly what my top priorities are this week.", "Я точно знаю свої головні пріоритети на цей тиждень."),
        agree(Support, POS, "I can count on my team when I get stuck.", "Я можу розраховувати на команду, коли застрягаю."),
        agree(Balance, NEG, "I expect to keep working after hours today.", "Я очікую, що сьогодні працюватиму після робочого часу."),
        open("What is taking most of your energy right now?", "Що зараз забирає найбільше твоєї енергії?"),
    ],
    [
        overall(NEG, "How tense do you feel at the start of today?", "Наскільки напружено ти почуваєшся на початку дня?"),
        agree(Meetings, NEG, "Meetings leave me too little time for focused work.", "Зустрічі залишають мені замало часу на зосереджену роботу."),
        agree(Autonomy, POS, "I can decide how to approach my own tasks.", "Я можу сам вирішувати, як виконувати свої задачі."),
        agree(Recognition, POS, "My recent work has been noticed by someone.", "Мою нещодавню роботу хтось помітив."),
        agree(Growth, POS, "I am learning something useful in my current work.", "Я вчуся чогось корисного у своїй поточній роботі."),
        open("What one change would make this week easier?", "Яка одна зміна зробила б цей тиждень легшим?"),
    ],
    [
        overall(NEG, "How much pressure are you under today, overall?", "Під яким загальним тиском ти сьогодні?"),
        agree(Workload, NEG, "I had to rush to meet deadlines in the last few days.", "Останні кілька днів мені доводилося поспішати, щоб вкластися в дедлайни."),
        agree(Clarity, NEG, "Requirements for my tasks keep changing without warning.", "Вимоги до моїх задач постійно змінюються без попередження."),
        agree(Support, POS, "My manager is available when I need a decision.", "Мій керівник доступний, коли мені потрібне рішення."),
        agree(Balance, POS, "I had enough time to rest yesterday evening.", "Учора ввечері я мав достатньо часу на відпочинок."),
        open("What slowed you down the most this week?", "Що найбільше сповільнювало тебе цього тижня?"),
    ],
    [
        overall(NEG, "How overloaded do you feel right now?", "Наскільки перевантаженим ти почуваєшся зараз?"),
        agree(Meetings, NEG, "I attend meetings where my presence is not really needed.", "Я відвідую зустрічі, де моя присутність насправді не потрібна."),
        agree(Autonomy, NEG, "I need approval for decisions I could make myself.", "Мені потрібне погодження для рішень, які я міг би ухвалити сам."),
        agree(Recognition, NEG, "Extra effort I put in tends to go unnoticed.", "Мої додаткові зусилля зазвичай лишаються непоміченими."),
        agree(Growth, NEG, "My work feels repetitive and offers little to learn.", "Моя робота здається одноманітною і мало чому вчить."),
        open("Is there anything you would like your manager to know?", "Чи є щось, що ти хотів би повідомити своєму керівнику?"),
    ],
    [
        overall(NEG, "How stressful has this week been so far?", "Наскільки стресовим був цей тиждень досі?"),
        agree(Workload, POS, "My tasks fit comfortably within my working hours.", "Мої задачі комфортно вміщуються в робочий час."),
        agree(Clarity, POS, "I understand how my work contributes to team goals.", "Я розумію, як моя робота впливає на цілі команди."),
        agree(Support, NEG, "I hesitate to ask colleagues for help.", "Я вагаюся просити колег про допомогу."),
        agree(Balance, NEG, "Work thoughts keep me up at night.", "Думки про роботу не дають мені заснути вночі."),
        open("What helped you recharge recently?", "Що допомогло тобі відновити сили останнім часом?"),
    ],
    [
        overall(POS, "How calm do you feel about your work today?", "Наскільки спокійно ти ставишся до своєї роботи сьогодні?"),
        agree(Meetings, POS, "Most meetings I attend have a clear agenda.", "Більшість зустрічей, які я відвідую, мають чіткий порядок денний."),
        agree(Autonomy, POS, "I have enough freedom to plan my own day.", "Я маю достатньо свободи, щоб планувати свій день."),
        agree(Recognition, POS, "I received useful feedback in the last two weeks.", "За останні два тижні я отримав корисний відгук."),
        agree(Growth, POS, "I see a clear next step for my professional growth.", "Я бачу чіткий наступний крок для свого професійного розвитку."),
        open("What would make your meetings more useful?", "Що зробило б твої зустрічі кориснішими?"),
    ],
    [
        overall(NEG, "How drained do you feel after your last workday?", "Наскільки виснаженим ти почуваєшся після останнього робочого дня?"),
        agree(Workload, NEG, "I am juggling more parallel tasks than I can track.", "Я жонглюю більшою кількістю паралельних задач, ніж можу відстежити."),
        agree(Clarity, NEG, "I am unsure what is expected from me on my current project.", "Я не впевнений, чого від мене очікують у поточному проєкті."),
        agree(Support, POS, "Someone on my team checked in on me recently.", "Хтось із команди нещодавно цікавився, як у мене справи."),
        agree(Balance, POS, "I was able to fully disconnect during my last day off.", "Під час останнього вихідного я зміг повністю відключитися від роботи."),
        open("What is one thing that went well this week?", "Що одне цього тижня пройшло добре?"),
    ],
    [
        overall(NEG, "How much stress are you carrying into today?", "Скільки стресу ти несеш у сьогоднішній день?"),
        agree(Meetings, NEG, "Back-to-back calls leave me no time to recover.", "Дзвінки один за одним не залишають мені часу на відновлення."),
        agree(Autonomy, NEG, "Someone else's decisions often undo my plans.", "Чужі рішення часто руйнують мої плани."),
        agree(Recognition, POS, "People I work with say thank you for my help.", "Люди, з якими я працюю, дякують мені за допомогу."),
        agree(Growth, NEG, "I have no time to learn new skills at work.", "На роботі в мене немає часу вчитися нових навичок."),
        open("What support would help you most right now?", "Яка підтримка допомогла б тобі найбільше зараз?"),
    ],
    [
        overall(POS, "How manageable does your work feel today?", "Наскільки керованою здається твоя робота сьогодні?"),
        agree(Workload, POS, "I finished what I planned for yesterday.", "Учора я завершив усе, що планував."),
        agree(Clarity, POS, "Decisions that affect my work are explained to me.", "Рішення, що впливають на мою роботу, мені пояснюють."),
        agree(Support, NEG, "I feel alone with the hardest parts of my work.", "Я почуваюся самотнім із найскладнішими частинами своєї роботи."),
        agree(Balance, NEG, "I skipped a break or lunch because of work this week.", "Цього тижня я пропускав перерву чи обід через роботу."),
        open("What drained your energy the most in the last few days?", "Що найбільше виснажувало тебе останні кілька днів?"),
    ],
    [
        overall(NEG, "Looking at the past ten days, how stressed have you been?", "Якщо оглянутися на останні десять днів, наскільки ти був у стресі?"),
        agree(Meetings, POS, "I can decline meetings that do not need me.", "Я можу відмовитися від зустрічей, де я не потрібен."),
        agree(Autonomy, POS, "I trust that I can change how my team works if needed.", "Я впевнений, що можу змінити те, як працює команда, якщо потрібно."),
        agree(Recognition, NEG, "I feel my contribution is undervalued compared to others.", "Я відчуваю, що мій внесок недооцінюють порівняно з іншими."),
        agree(Growth, POS, "My manager supports my development goals.", "Мій керівник підтримує мої цілі розвитку."),
        open("If you could change one thing about your work, what would it be?", "Якби ти міг змінити одну річ у своїй роботі, що б це було?"),
    ],
];

// Резерв: лише для унікального перемішування, в денні набори не входить
static RESERVE: [SeedQuestion; 30] = [
    agree(Workload, NEG, "Unplanned requests interrupted my work repeatedly.", "Незаплановані запити раз у раз переривали мою роботу."),
    agree(Workload, POS, "My current pace feels sustainable for the next month.", "Мій нинішній темп здається посильним на наступний місяць."),
    agree(Workload, NEG, "I worry about the tasks I could not finish.", "Мене турбують задачі, які я не встиг завершити."),
    agree(Meetings, NEG, "I spend more time talking about work than doing it.", "Я витрачаю більше часу на розмови про роботу, ніж на саму роботу."),
    agree(Meetings, POS, "Meetings end with clear next steps.", "Зустрічі завершуються чіткими наступними кроками."),
    agree(Meetings, NEG, "Meetings are often scheduled during my focus time.", "Зустрічі часто призначають на мій час для зосередженої роботи."),
    agree(Clarity, POS, "I know whom to ask when something is unclear.", "Я знаю, до кого звернутися, коли щось незрозуміло."),
    agree(Clarity, NEG, "Different people give me conflicting priorities.", "Різні люди ставлять мені суперечливі пріоритети."),
    agree(Clarity, POS, "Success criteria for my tasks are clear to me.", "Критерії успіху моїх задач мені зрозумілі."),
    agree(Autonomy, POS, "I can choose the tools and methods I use.", "Я можу обирати інструменти та методи, якими користуюся."),
    agree(Autonomy, NEG, "My work is checked more closely than it needs to be.", "Мою роботу перевіряють прискіпливіше, ніж потрібно."),
    agree(Autonomy, POS, "My ideas influence how things get done here.", "Мої ідеї впливають на те, як тут усе робиться."),
    agree(Recognition, POS, "I feel valued as a member of this team.", "Я відчуваю, що мене цінують як члена цієї команди."),
    agree(Recognition, NEG, "Credit for shared work rarely reaches me.", "Визнання за спільну роботу рідко доходить до мене."),
    agree(Recognition, POS, "My manager notices when I go the extra mile.", "Мій керівник помічає, коли я роблю більше, ніж треба."),
    agree(Support, POS, "I can talk openly about difficulties at work.", "Я можу відкрито говорити про труднощі на роботі."),
    agree(Support, NEG, "Asking for help here feels like a sign of weakness.", "Просити про допомогу тут здається ознакою слабкості."),
    agree(Support, POS, "Colleagues share knowledge with me willingly.", "Колеги охоче діляться зі мною знаннями."),
    agree(Balance, NEG, "I answered work messages during personal time this week.", "Цього тижня я відповідав на робочі повідомлення в особистий час."),
    agree(Balance, POS, "I have energy left for my life after work.", "Після роботи в мене лишається енергія на особисте життя."),
    agree(Balance, NEG, "I feel guilty when I take time off.", "Я відчуваю провину, коли беру відгул."),
    agree(Growth, POS, "I have goals at work that motivate me.", "У мене є робочі цілі, які мене мотивують."),
    agree(Growth, NEG, "I feel stuck in my current role.", "Я відчуваю, що застряг на своїй поточній посаді."),
    agree(Growth, POS, "I had a chance to try something new recently.", "Нещодавно я мав можливість спробувати щось нове."),
    open("What is one thing your team could stop doing?", "Що одне твоя команда могла б перестати робити?"),
    open("What made you proud at work recently?", "Чим ти пишався на роботі останнім часом?"),
    open("What is worrying you about the coming week?", "Що тебе турбує щодо наступного тижня?"),
    open("Which task would you hand off if you could?", "Яку задачу ти б передав комусь, якби міг?"),
    pick_one(
        "What would help you most this week?",
        "Що допомогло б тобі найбільше цього тижня?",
        &["Fewer meetings", "Clearer priorities", "More focus time", "Help with a task", "Feedback from my manager"],
        &["Менше зустрічей", "Чіткіші пріоритети", "Більше часу на зосередження", "Допомога із задачею", "Відгук від керівника"],
    ),
    pick_one(
        "Which change would reduce your stress the most?",
        "Яка зміна найбільше зменшила б твій стрес?",
        &["A lighter workload", "Fewer interruptions", "More recognition", "More flexibility", "Time to learn"],
        &["Менше навантаження", "Менше відволікань", "Більше визнання", "Більше гнучкості", "Час на навчання"],
    ),
];

static POOL: Lazy<Vec<SeedQuestion>> = Lazy::new(|| {
    DAYS.iter()
        .flat_map(|day| day.iter().copied())
        .chain(RESERVE.iter().copied())
        .collect()
});

impl SeedQuestion {
    pub fn text(&self, language: Language) -> &'static str {
        match language {
            Language::En => self.en,
            Language::Uk => self.uk,
        }
    }

    pub fn to_draft(&self, language: Language) -> QuestionDraft {
        let choices = match language {
            Language::En => self.choices_en,
            Language::Uk => self.choices_uk,
        };
        QuestionDraft {
            text: self.text(language).to_string(),
            qtype: self.qtype,
            scale_min: self.scale.map(|(min, _)| min),
            scale_max: self.scale.map(|(_, max)| max),
            driver_key: self.driver,
            polarity: self.polarity,
            needs_review: false,
            choices: if choices.is_empty() {
                None
            } else {
                Some(choices.iter().map(|c| c.to_string()).collect())
            },
            required: self.qtype == QuestionType::Scale,
        }
    }
}

pub fn day_set(day_index: i32) -> Option<&'static [SeedQuestion]> {
    if !(1..=SEED_DAYS).contains(&day_index) {
        return None;
    }
    DAYS.get((day_index - 1) as usize).map(|day| day.as_slice())
}

pub fn pool() -> &'static [SeedQuestion] {
    POOL.as_slice()
}

/// Canonical, shared (not member-specific) template for an early day.
pub fn seed_day_template(day_index: i32, language: Language) -> Option<NewTemplate> {
    let questions = day_set(day_index)?
        .iter()
        .map(|q| q.to_draft(language))
        .collect();
    Some(NewTemplate {
        language,
        source: TemplateSource::Seed,
        day_index,
        created_for_member_id: None,
        questions,
    })
}

/// Deterministic per-member draw from the whole pool, skipping everything already seen.
///
/// Returns `None` when fewer than the required number of unseen questions remain;
/// repeating content is never an option.
pub fn unique_shuffle_template(
    member_id: Uuid,
    day_index: i32,
    language: Language,
    seen_title_hashes: &HashSet<String>,
) -> Option<NewTemplate> {
    let mut candidates: Vec<SeedQuestion> = pool().to_vec();
    let key = shuffle_key(&member_id.to_string(), day_index, language.as_str());
    seeded_shuffle(&mut candidates, &key);

    let unseen: Vec<QuestionDraft> = candidates
        .iter()
        .filter(|q| !seen_title_hashes.contains(&title_hash(q.text(language))))
        .map(|q| q.to_draft(language))
        .collect();

    if unseen.len() < REQUIRED_QUESTION_COUNT {
        tracing::warn!(
            "Unique shuffle for member {} day {} has only {} unseen seed questions",
            member_id,
            day_index,
            unseen.len()
        );
        return None;
    }

    Some(NewTemplate {
        language,
        source: TemplateSource::Seed,
        day_index,
        created_for_member_id: Some(member_id),
        questions: unseen.into_iter().take(REQUIRED_QUESTION_COUNT).collect(),
    })
}
