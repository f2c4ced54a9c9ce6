//! Shared university fixture for the integration tests.
//!
//! Classes: `Person`, `Organization`, `Company(Organization)`, the role
//! `CEO` over `Person` and the role `Representative` over `CEO`.
//!
//! Property kinds:
//! - `MemberOf` <-> `Member` (inverses)
//! - `WorksFor` < `MemberOf`, `HeadOf` < `WorksFor`
//! - `Knows` (symmetric)
//! - `SubOrganizationOf` (transitive, irreflexive)
//! - `ParentOf`, and `AncestorOf` from the chains `(ParentOf, ParentOf)`
//!   and `(ParentOf, AncestorOf)`
//! - `Employs` == `HasStaff` (equivalent)
//! - `BoardMember`, ranging over CEOs

#![allow(dead_code)]

use ontograph_core::{
    ClassId, ContainerKind, FieldId, FieldShape, KnowledgeBase, KnowledgeBaseConfig, PropertyId,
    PropertySpec, RelationKey, Semantics, Symbol,
};

pub struct University {
    pub kb: KnowledgeBase,
    // classes
    pub person: ClassId,
    pub organization: ClassId,
    pub company: ClassId,
    pub ceo: ClassId,
    pub representative: ClassId,
    // fields
    pub works_for: FieldId,
    pub member_of: FieldId,
    pub members: FieldId,
    pub head_of: FieldId,
    pub knows: FieldId,
    pub sub_organization_of: FieldId,
    pub parent_of: FieldId,
    pub ancestor_of: FieldId,
    pub employs: FieldId,
    pub staff: FieldId,
    pub board: FieldId,
    // property kinds
    pub member_of_kind: PropertyId,
    pub member_kind: PropertyId,
    pub works_for_kind: PropertyId,
    pub sub_organization_kind: PropertyId,
    pub ancestor_of_kind: PropertyId,
}

pub fn university() -> University {
    university_with(KnowledgeBaseConfig::default())
}

pub fn university_with(config: KnowledgeBaseConfig) -> University {
    let mut kb = KnowledgeBase::with_config(config);

    let diagram = kb.classes_mut();
    let person = diagram.declare_class("Person", &[]).expect("Person");
    let organization = diagram
        .declare_class("Organization", &[])
        .expect("Organization");
    let company = diagram
        .declare_class("Company", &[organization])
        .expect("Company");
    let ceo = diagram.declare_role("CEO", person, &[]).expect("CEO");
    let representative = diagram
        .declare_role("Representative", ceo, &[])
        .expect("Representative");

    let set = FieldShape::Collection(ContainerKind::Set);
    let fields = [
        (person, "works_for", organization),
        (person, "member_of", organization),
        (person, "knows", person),
        (person, "parent_of", person),
        (person, "ancestor_of", person),
        (organization, "members", person),
        (organization, "sub_organization_of", organization),
        (organization, "employs", person),
        (organization, "staff", person),
        (organization, "board", ceo),
        (ceo, "head_of", organization),
    ];
    for (class, name, range) in fields {
        diagram.declare_field(class, name, range, set).expect(name);
    }

    let catalog = kb.properties_mut();
    let member_of_kind = catalog
        .declare("MemberOf", PropertySpec::new())
        .expect("MemberOf");
    let member_kind = catalog.declare("Member", PropertySpec::new()).expect("Member");
    catalog
        .set_inverse(member_of_kind, member_kind)
        .expect("inverse");
    let works_for_kind = catalog
        .declare("WorksFor", PropertySpec::new().with_super(member_of_kind))
        .expect("WorksFor");
    let head_of_kind = catalog
        .declare("HeadOf", PropertySpec::new().with_super(works_for_kind))
        .expect("HeadOf");
    let knows_kind = catalog
        .declare(
            "Knows",
            PropertySpec::new().with_semantics(Semantics::none().symmetric()),
        )
        .expect("Knows");
    let sub_organization_kind = catalog
        .declare(
            "SubOrganizationOf",
            PropertySpec::new().with_semantics(Semantics::none().transitive().irreflexive()),
        )
        .expect("SubOrganizationOf");
    let parent_of_kind = catalog
        .declare(
            "ParentOf",
            PropertySpec::new().with_semantics(Semantics::none().asymmetric().irreflexive()),
        )
        .expect("ParentOf");
    let ancestor_of_kind = catalog
        .declare(
            "AncestorOf",
            PropertySpec::new().with_semantics(Semantics::none().irreflexive()),
        )
        .expect("AncestorOf");
    catalog
        .add_chain_axiom(ancestor_of_kind, &[parent_of_kind, parent_of_kind])
        .expect("two parents");
    catalog
        .add_chain_axiom(ancestor_of_kind, &[parent_of_kind, ancestor_of_kind])
        .expect("parent then ancestor");
    let employs_kind = catalog
        .declare("Employs", PropertySpec::new())
        .expect("Employs");
    let has_staff_kind = catalog
        .declare("HasStaff", PropertySpec::new())
        .expect("HasStaff");
    catalog
        .add_equivalent(employs_kind, has_staff_kind)
        .expect("equivalent");
    let board_member_kind = catalog
        .declare("BoardMember", PropertySpec::new())
        .expect("BoardMember");

    let mut attach = |kind: PropertyId, domain: ClassId, name: &str| {
        kb.attach(kind, domain, name).expect(name)
    };
    let works_for = attach(works_for_kind, person, "works_for");
    let member_of = attach(member_of_kind, person, "member_of");
    let members = attach(member_kind, organization, "members");
    let head_of = attach(head_of_kind, ceo, "head_of");
    let knows = attach(knows_kind, person, "knows");
    let sub_organization_of = attach(sub_organization_kind, organization, "sub_organization_of");
    let parent_of = attach(parent_of_kind, person, "parent_of");
    let ancestor_of = attach(ancestor_of_kind, person, "ancestor_of");
    let employs = attach(employs_kind, organization, "employs");
    let staff = attach(has_staff_kind, organization, "staff");
    let board = attach(board_member_kind, organization, "board");

    University {
        kb,
        person,
        organization,
        company,
        ceo,
        representative,
        works_for,
        member_of,
        members,
        head_of,
        knows,
        sub_organization_of,
        parent_of,
        ancestor_of,
        employs,
        staff,
        board,
        member_of_kind,
        member_kind,
        works_for_kind,
        sub_organization_kind,
        ancestor_of_kind,
    }
}

impl University {
    pub fn person(&mut self, label: &str) -> Symbol {
        self.kb.create(self.person, label).expect("person")
    }

    pub fn organization(&mut self, label: &str) -> Symbol {
        self.kb.create(self.organization, label).expect("organization")
    }

    pub fn company(&mut self, label: &str) -> Symbol {
        self.kb.create(self.company, label).expect("company")
    }

    /// Add one element to a collection field.
    pub fn add(&mut self, owner: &Symbol, field: FieldId, value: &Symbol) -> bool {
        self.kb
            .collection(owner, field)
            .expect("collection")
            .add(value)
            .expect("add")
    }

    /// Whether `value` is stored in `field` of `owner`.
    pub fn has(&self, owner: &Symbol, field: FieldId, value: &Symbol) -> bool {
        self.kb.holds(owner, field, value).expect("holds")
    }

    /// Labels stored in `field` of `owner`, sorted.
    pub fn labels(&self, owner: &Symbol, field: FieldId) -> Vec<String> {
        let mut labels: Vec<String> = self
            .kb
            .values(owner, field)
            .expect("values")
            .iter()
            .map(|s| s.label().to_string())
            .collect();
        labels.sort();
        labels
    }

    /// The graph edge `source --name--> target`, if admitted.
    pub fn edge(&self, source: &Symbol, name: &str, target: &Symbol) -> Option<ontograph_core::Relation> {
        let graph = self.kb.graph();
        let key = RelationKey {
            source: graph.node_of(source)?,
            target: graph.node_of(target)?,
            name: self.kb.classes().name_id(name)?,
        };
        graph.relation(&key).copied()
    }

    pub fn relation_count(&self) -> usize {
        self.kb.graph().relation_count()
    }
}
