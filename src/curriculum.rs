//! Static knowledge map the learner picks concepts from.
//!
//! Four sections of four topics. Topic ids are shared across languages;
//! only titles are localized.

use crate::language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnowledgeNode {
    pub id: &'static str,
    pub title: &'static str,
    pub children: &'static [KnowledgeNode],
}

const fn leaf(id: &'static str, title: &'static str) -> KnowledgeNode {
    KnowledgeNode { id, title, children: &[] }
}

const fn section(id: &'static str, title: &'static str, children: &'static [KnowledgeNode]) -> KnowledgeNode {
    KnowledgeNode { id, title, children }
}

static MAP_EN: [KnowledgeNode; 4] = [
    section("foundations", "Frontend Foundations", &[
        leaf("html-semantics", "HTML5 Semantics & A11y"),
        leaf("css-box-model", "CSS Box Model & Layout"),
        leaf("dom-manipulation", "DOM Manipulation"),
        leaf("responsive-design", "Responsive Design"),
    ]),
    section("js-core", "JavaScript Core", &[
        leaf("es6-syntax", "ES6+ Syntax (Arrow fns, Destructuring)"),
        leaf("async-programming", "Async/Await & Promises"),
        leaf("closures-scope", "Closures & Scope"),
        leaf("event-loop", "Event Loop & Concurrency"),
    ]),
    section("react-ecosystem", "React Ecosystem", &[
        leaf("components-props", "Components & Props"),
        leaf("hooks-basic", "Hooks (useState, useEffect)"),
        leaf("state-management", "Global State (Context/Redux)"),
        leaf("react-performance", "React Performance & Memo"),
    ]),
    section("modern-tooling", "Modern Tooling", &[
        leaf("bundlers", "Vite & Webpack"),
        leaf("typescript", "TypeScript Basics"),
        leaf("tailwind", "Tailwind CSS"),
        leaf("testing", "Unit & E2E Testing"),
    ]),
];

static MAP_CN: [KnowledgeNode; 4] = [
    section("foundations", "前端基础", &[
        leaf("html-semantics", "HTML5 语义化与无障碍"),
        leaf("css-box-model", "CSS 盒模型与布局"),
        leaf("dom-manipulation", "DOM 操作"),
        leaf("responsive-design", "响应式设计"),
    ]),
    section("js-core", "JavaScript 核心", &[
        leaf("es6-syntax", "ES6+ 语法 (箭头函数, 解构)"),
        leaf("async-programming", "异步编程 (Async/Await & Promises)"),
        leaf("closures-scope", "闭包与作用域"),
        leaf("event-loop", "事件循环与并发"),
    ]),
    section("react-ecosystem", "React 生态", &[
        leaf("components-props", "组件与 Props"),
        leaf("hooks-basic", "Hooks (useState, useEffect)"),
        leaf("state-management", "全局状态管理 (Context/Redux)"),
        leaf("react-performance", "React 性能优化 & Memo"),
    ]),
    section("modern-tooling", "现代工具链", &[
        leaf("bundlers", "打包工具 (Vite & Webpack)"),
        leaf("typescript", "TypeScript 基础"),
        leaf("tailwind", "Tailwind CSS"),
        leaf("testing", "单元测试 & E2E 测试"),
    ]),
];

pub fn knowledge_map(language: Language) -> &'static [KnowledgeNode] {
    match language {
        Language::En => &MAP_EN,
        Language::Cn => &MAP_CN,
    }
}

/// Look up a topic (leaf) by id.
pub fn find_topic(language: Language, id: &str) -> Option<&'static KnowledgeNode> {
    knowledge_map(language)
        .iter()
        .flat_map(|s| s.children.iter())
        .find(|t| t.id == id)
}
