use yew::prelude::*;

use meadow_core::DEFAULT_ELEMENT_MULTIPLIER;

use crate::app_router;
use crate::app_runtime;
use crate::contact_form::ContactSection;
use crate::keyword_runtime::KeywordContext;
use crate::keyword_sections::KeywordSections;
use crate::parallax_hooks::{use_background_parallax, use_element_parallax};
use crate::search::Search;

const NAV_LINKS: &[(&str, &str)] = &[
    ("about", "About"),
    ("notes", "Notes"),
    ("contact", "Contact"),
];

#[derive(Properties, PartialEq)]
pub(crate) struct AppProps {
    pub(crate) keywords: KeywordContext,
}

#[function_component(App)]
pub(crate) fn app(props: &AppProps) -> Html {
    let context = props.keywords.clone();
    let section = app_router::use_hash_navigation(context.clone());
    let config = app_runtime::site_config();

    html! {
        <ContextProvider<KeywordContext> context={context}>
            <Background image={AttrValue::from(config.background_image)} />
            <div class="page">
                <Header active={section.map(AttrValue::from)} />
                <main class="content">
                    <Intro />
                    <About />
                    <Notes />
                    <KeywordSections />
                    <section id="contact" class="panel contact">
                        <h2>{ "Contact" }</h2>
                        <p>{ "Questions, ideas or just hello. Notes go straight to my inbox." }</p>
                        <ContactSection />
                    </section>
                </main>
                <footer class="footer">
                    <p>{ "Made by hand, compiled to wasm." }</p>
                </footer>
            </div>
        </ContextProvider<KeywordContext>>
    }
}

#[derive(Properties, PartialEq)]
struct BackgroundProps {
    image: AttrValue,
}

#[function_component(Background)]
fn background(props: &BackgroundProps) -> Html {
    let node = use_node_ref();
    let max_offset = use_background_parallax(node.clone(), props.image.clone());
    let class = classes!("background", (max_offset <= 0.0).then_some("background-static"));
    let style = format!("background-image: url('{}');", props.image);
    html! {
        <div ref={node} class={class} style={style} aria-hidden="true" />
    }
}

#[derive(Properties, PartialEq)]
struct HeaderProps {
    active: Option<AttrValue>,
}

#[function_component(Header)]
fn header(props: &HeaderProps) -> Html {
    let links = NAV_LINKS
        .iter()
        .map(|(id, label)| {
            let current = props.active.as_deref() == Some(*id);
            let class = classes!("nav-link", current.then_some("nav-link-current"));
            html! {
                <a class={class} href={format!("#{id}")}>{ *label }</a>
            }
        })
        .collect::<Html>();
    html! {
        <header class="header">
            <a class="brand" href="#">{ "meadow" }</a>
            <nav class="nav">{links}</nav>
            <Search />
        </header>
    }
}

#[derive(Properties, PartialEq)]
struct ParallaxFigureProps {
    src: AttrValue,
    alt: AttrValue,
    #[prop_or(DEFAULT_ELEMENT_MULTIPLIER)]
    multiplier: f64,
}

#[function_component(ParallaxFigure)]
fn parallax_figure(props: &ParallaxFigureProps) -> Html {
    let node = use_node_ref();
    use_element_parallax(node.clone(), props.multiplier);
    html! {
        <figure ref={node} class="parallax-figure">
            <img src={props.src.clone()} alt={props.alt.clone()} loading="lazy" />
        </figure>
    }
}

#[function_component(Intro)]
fn intro() -> Html {
    html! {
        <section class="panel intro">
            <h1>{ "Hi, I build small, quiet software." }</h1>
            <p>{ "Tools, sketches and the occasional essay, mostly about making the web feel slower in a good way." }</p>
            <ParallaxFigure src="images/stones.png" alt="Stacked river stones" multiplier={0.15} />
        </section>
    }
}

#[function_component(About)]
fn about() -> Html {
    html! {
        <section id="about" class="panel about">
            <h2>{ "About" }</h2>
            <p>{ "I work on browsers, compilers and the odd garden fence. This site is a place to keep things I want to remember." }</p>
            <ParallaxFigure src="images/fern.png" alt="A fern unrolling" />
            <p>{ "There is more here than the menu shows. The search box up top knows a few words." }</p>
        </section>
    }
}

#[function_component(Notes)]
fn notes() -> Html {
    let entries = [
        ("On scroll-linked motion", "Transforms only, one write per frame, and stop asking for frames once nothing moves."),
        ("Keeping pages light", "Lazy images, no trackers, a single wasm bundle."),
        ("Reading list", "Long walks, short books, good paper."),
    ];
    let items = entries
        .iter()
        .map(|(title, body)| {
            html! {
                <li class="note">
                    <h3>{ *title }</h3>
                    <p>{ *body }</p>
                </li>
            }
        })
        .collect::<Html>();
    html! {
        <section id="notes" class="panel notes">
            <h2>{ "Notes" }</h2>
            <ul class="note-list">{items}</ul>
            <ParallaxFigure src="images/seeds.png" alt="Dandelion seeds drifting" multiplier={-0.08} />
        </section>
    }
}
