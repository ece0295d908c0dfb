//! Built-in lesson content and the loader that turns it into lessons.

use rand::Rng;

use crate::generator::generate_questions;
use crate::model::{Lesson, LessonError, LessonId, VocabularySet};
use crate::parser::parse_vocabulary;

/// Static description of a lesson: metadata plus raw vocabulary text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonSource {
    pub id: u64,
    pub title: &'static str,
    pub description: &'static str,
    pub vocabulary: &'static str,
}

impl LessonSource {
    /// Parse this source's vocabulary into a titled set.
    #[must_use]
    pub fn vocabulary_set(&self) -> VocabularySet {
        VocabularySet::new(self.title, parse_vocabulary(self.vocabulary))
    }
}

/// Build lessons from their sources, generating a freshly shuffled deck for each.
///
/// Call once at startup and hand the result to the session layer.
///
/// # Errors
///
/// Returns `LessonError` if a source has a blank title or a vocabulary that
/// yields no questions.
pub fn load_lessons<R: Rng + ?Sized>(
    sources: &[LessonSource],
    rng: &mut R,
) -> Result<Vec<Lesson>, LessonError> {
    sources
        .iter()
        .map(|source| {
            let vocabulary = parse_vocabulary(source.vocabulary);
            let questions = generate_questions(&vocabulary, rng);
            Lesson::new(
                LessonId::new(source.id),
                source.title,
                source.description,
                questions,
                vocabulary,
            )
        })
        .collect()
}

/// The lessons shipped with the application.
#[must_use]
pub fn builtin_sources() -> &'static [LessonSource] {
    &BUILTIN
}

const BUILTIN: [LessonSource; 6] = [
    LessonSource {
        id: 1,
        title: "Body parts",
        description: "Learn the Spanish names of body parts",
        vocabulary: BODY_PARTS,
    },
    LessonSource {
        id: 2,
        title: "Food",
        description: "Everyday food and groceries",
        vocabulary: FOOD,
    },
    LessonSource {
        id: 3,
        title: "Excursion",
        description: "Things to pack for a trip",
        vocabulary: EXCURSION,
    },
    LessonSource {
        id: 4,
        title: "Numbers 11-20",
        description: "Count from eleven to twenty in Spanish",
        vocabulary: NUMBERS,
    },
    LessonSource {
        id: 5,
        title: "Words with A",
        description: "Common nouns starting with A",
        vocabulary: A_WORDS,
    },
    LessonSource {
        id: 6,
        title: "People and jobs",
        description: "Professions and people starting with A",
        vocabulary: A_PEOPLE,
    },
];

const BODY_PARTS: &str = "
la cabeza - głowa
la nariz - nos
la boca - usta
la oreja - ucho
el ojo - oko
la ceja - brew
el pelo - włosy
el cuello - szyja
el pecho - klatka piersiowa
la mano - dłoń
el dedo - palec
el estómago - żołądek
la pierna - noga
el pie - stopa
el brazo - ramię
la espalda - plecy
";

const FOOD: &str = "
la leche - mleko
la harina - mąka
el atún - tuńczyk
el jamón - szynka
las manzanas - jabłka
las fresas - truskawki
la mantequilla - masło
la pasta - makaron
las zanahorias - marchewki
los tomates - pomidory
las cebollas - cebule
el aceite - olej
las sardinas - sardynki
las aceitunas - oliwki
el pan - chleb
los huevos - jajka
las lechugas - sałaty
las patatas fritas - frytki
";

const EXCURSION: &str = "
la gorra - czapka z daszkiem
las botas - buty trekkingowe
el sombrero - kapelusz
las chanclas - klapki
las gafas de sol - okulary przeciwsłoneczne
el bañador - kąpielówki
la crema solar - krem przeciwsłoneczny
la linterna - latarka
el saco de dormir - śpiwór
la tienda de campaña - namiot
los prismáticos - lornetka
el chubasquero - kurtka przeciwdeszczowa
la cámara de fotos - aparat fotograficzny
";

const NUMBERS: &str = "
once - jedenaście
doce - dwanaście
trece - trzynaście
catorce - czternaście
quince - piętnaście
dieciséis - szesnaście
diecisiete - siedemnaście
dieciocho - osiemnaście
diecinueve - dziewiętnaście
veinte - dwadzieścia
";

const A_WORDS: &str = "
el agua - woda
el amor - miłość
el aire - powietrze
el amigo - przyjaciel
la amiga - przyjaciółka
el árbol - drzewo
el avión - samolot
";

const A_PEOPLE: &str = "
el abogado - adwokat
el actor - aktor
la actriz - aktorka
el arquitecto - architekt
el artista - artysta
el alumno - uczeń
el autor - autor
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn builtin_lessons_load() {
        let lessons = load_lessons(builtin_sources(), &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(lessons.len(), 6);

        let body = &lessons[0];
        assert_eq!(body.id(), LessonId::new(1));
        assert_eq!(body.vocabulary().len(), 16);
        // 16 pairs: 32 multiple-choice, 32 text-input, 4 matching blocks.
        assert_eq!(body.questions().len(), 68);
        assert_eq!(body.progress(), 0);
    }

    #[test]
    fn excursion_drops_trailing_pairs_from_matching() {
        let lessons = load_lessons(builtin_sources(), &mut StdRng::seed_from_u64(1)).unwrap();
        let excursion = lessons.iter().find(|l| l.title() == "Excursion").unwrap();
        let blocks = excursion
            .questions()
            .iter()
            .filter(|q| matches!(q.kind, QuestionKind::Matching(_)))
            .count();
        assert_eq!(excursion.vocabulary().len(), 13);
        assert_eq!(blocks, 3);
    }

    #[test]
    fn empty_source_is_rejected() {
        let sources = [LessonSource {
            id: 9,
            title: "Empty",
            description: "",
            vocabulary: "\n\n",
        }];
        let err = load_lessons(&sources, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert_eq!(err, LessonError::NoQuestions);
    }

    #[test]
    fn sources_expose_vocabulary_sets() {
        let set = builtin_sources()[3].vocabulary_set();
        assert_eq!(set.title, "Numbers 11-20");
        assert_eq!(set.words.len(), 10);
    }
}
