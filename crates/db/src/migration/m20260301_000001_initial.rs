//! Initial database migration.
//!
//! Creates enums, tenant tables, indexes, constraints and RLS policies.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TENANTS
        // ============================================================
        db.execute_unprepared(SCHOOLS_SQL).await?;

        // ============================================================
        // PART 3: ACCOUNTING
        // ============================================================
        db.execute_unprepared(CHART_OF_ACCOUNTS_SQL).await?;
        db.execute_unprepared(FISCAL_YEARS_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(LEDGER_ENTRIES_SQL).await?;
        db.execute_unprepared(ACCOUNT_BALANCES_SQL).await?;

        // ============================================================
        // PART 4: PEOPLE AND CLASSES
        // ============================================================
        db.execute_unprepared(TEACHERS_SQL).await?;
        db.execute_unprepared(CLASSES_SQL).await?;
        db.execute_unprepared(STUDENTS_SQL).await?;

        // ============================================================
        // PART 5: ACADEMICS
        // ============================================================
        db.execute_unprepared(RESULTS_SQL).await?;
        db.execute_unprepared(QUESTIONS_SQL).await?;
        db.execute_unprepared(EXAMS_SQL).await?;

        // ============================================================
        // PART 6: ROW-LEVEL SECURITY
        // ============================================================
        db.execute_unprepared(RLS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE account_type AS ENUM ('asset', 'liability', 'equity', 'revenue', 'expense');

CREATE TYPE journal_source AS ENUM (
    'manual',
    'fees',
    'payroll',
    'expense',
    'wallet',
    'reversal',
    'opening_balance'
);

CREATE TYPE teacher_status AS ENUM ('draft', 'active', 'on_leave', 'inactive');
CREATE TYPE gender AS ENUM ('male', 'female');
CREATE TYPE employment_type AS ENUM ('full_time', 'part_time', 'contract');
CREATE TYPE term AS ENUM ('first', 'second', 'third');
CREATE TYPE question_kind AS ENUM ('multiple_choice', 'true_false', 'short_answer', 'essay');
CREATE TYPE difficulty AS ENUM ('easy', 'medium', 'hard');
";

const SCHOOLS_SQL: &str = r"
CREATE TABLE schools (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    slug VARCHAR(100) NOT NULL UNIQUE,
    currency CHAR(3) NOT NULL DEFAULT 'NGN',
    address TEXT,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const CHART_OF_ACCOUNTS_SQL: &str = r"
CREATE TABLE chart_of_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    school_id UUID NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    code VARCHAR(20) NOT NULL,
    name VARCHAR(255) NOT NULL,
    description TEXT,
    account_type account_type NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    is_system BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (school_id, code)
);

CREATE INDEX idx_coa_school ON chart_of_accounts(school_id) WHERE is_active = true;
CREATE INDEX idx_coa_type ON chart_of_accounts(school_id, account_type);
";

const FISCAL_YEARS_SQL: &str = r"
CREATE TABLE fiscal_years (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    school_id UUID NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    name VARCHAR(50) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    is_current BOOLEAN NOT NULL DEFAULT false,
    is_closed BOOLEAN NOT NULL DEFAULT false,
    closed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (school_id, name),
    CONSTRAINT chk_fiscal_year_dates CHECK (start_date < end_date)
);

CREATE UNIQUE INDEX idx_fiscal_year_current ON fiscal_years(school_id) WHERE is_current = true;
CREATE INDEX idx_fiscal_year_dates ON fiscal_years(school_id, start_date, end_date);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    school_id UUID NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    fiscal_year_id UUID NOT NULL REFERENCES fiscal_years(id),
    entry_number VARCHAR(40) NOT NULL,
    sequence BIGINT NOT NULL,
    entry_date DATE NOT NULL,
    description TEXT NOT NULL,
    reference VARCHAR(100),
    source journal_source NOT NULL DEFAULT 'manual',
    total_debit BIGINT NOT NULL,
    total_credit BIGINT NOT NULL,
    is_posted BOOLEAN NOT NULL DEFAULT false,
    posted_at TIMESTAMPTZ,
    is_reversed BOOLEAN NOT NULL DEFAULT false,
    reversal_of_id UUID REFERENCES journal_entries(id),
    reversed_by_id UUID REFERENCES journal_entries(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (school_id, fiscal_year_id, sequence),
    UNIQUE (school_id, entry_number),
    CONSTRAINT chk_journal_totals CHECK (total_debit >= 0 AND total_credit >= 0)
);

CREATE INDEX idx_journal_school_date ON journal_entries(school_id, entry_date DESC);
CREATE INDEX idx_journal_source ON journal_entries(school_id, source);
CREATE INDEX idx_journal_reversal ON journal_entries(reversal_of_id) WHERE reversal_of_id IS NOT NULL;
";

const LEDGER_ENTRIES_SQL: &str = r"
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    school_id UUID NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    journal_entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES chart_of_accounts(id),
    line_number INTEGER NOT NULL,
    debit BIGINT NOT NULL DEFAULT 0,
    credit BIGINT NOT NULL DEFAULT 0,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (journal_entry_id, line_number),
    CONSTRAINT chk_line_amounts CHECK (debit >= 0 AND credit >= 0),
    CONSTRAINT chk_line_one_side CHECK ((debit = 0) <> (credit = 0))
);

CREATE INDEX idx_ledger_journal ON ledger_entries(journal_entry_id);
CREATE INDEX idx_ledger_account ON ledger_entries(account_id);
";

const ACCOUNT_BALANCES_SQL: &str = r"
CREATE TABLE account_balances (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    school_id UUID NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES chart_of_accounts(id) ON DELETE CASCADE,
    balance_date DATE NOT NULL,
    balance BIGINT NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (account_id, balance_date)
);

CREATE INDEX idx_balance_account_date ON account_balances(account_id, balance_date DESC);
";

const TEACHERS_SQL: &str = r"
CREATE TABLE teachers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    school_id UUID NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    status teacher_status NOT NULL DEFAULT 'draft',
    first_name VARCHAR(100),
    last_name VARCHAR(100),
    gender gender,
    date_of_birth DATE,
    email VARCHAR(255),
    phone VARCHAR(30),
    address TEXT,
    highest_qualification VARCHAR(100),
    specialization VARCHAR(100),
    subjects JSONB NOT NULL DEFAULT '[]',
    staff_number VARCHAR(32),
    employment_date DATE,
    employment_type employment_type,
    salary BIGINT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX idx_teacher_email ON teachers(school_id, lower(email)) WHERE email IS NOT NULL;
CREATE UNIQUE INDEX idx_teacher_staff_number ON teachers(school_id, staff_number) WHERE staff_number IS NOT NULL;
CREATE INDEX idx_teacher_status ON teachers(school_id, status);
";

const CLASSES_SQL: &str = r"
CREATE TABLE classes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    school_id UUID NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    name VARCHAR(50) NOT NULL,
    level VARCHAR(20) NOT NULL,
    class_teacher_id UUID REFERENCES teachers(id) ON DELETE SET NULL,
    capacity INTEGER,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (school_id, name),
    CONSTRAINT chk_class_capacity CHECK (capacity IS NULL OR capacity > 0)
);
";

const STUDENTS_SQL: &str = r"
CREATE TABLE students (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    school_id UUID NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    class_id UUID REFERENCES classes(id),
    admission_number VARCHAR(32) NOT NULL,
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    gender gender NOT NULL,
    date_of_birth DATE,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (school_id, admission_number)
);

CREATE INDEX idx_student_class ON students(class_id) WHERE class_id IS NOT NULL;
";

const RESULTS_SQL: &str = r"
CREATE TABLE results (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    school_id UUID NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    student_id UUID NOT NULL REFERENCES students(id) ON DELETE CASCADE,
    class_id UUID NOT NULL REFERENCES classes(id),
    subject VARCHAR(100) NOT NULL,
    term term NOT NULL,
    session VARCHAR(9) NOT NULL,
    ca_score NUMERIC(5, 2) NOT NULL,
    exam_score NUMERIC(5, 2) NOT NULL,
    total NUMERIC(5, 2) NOT NULL,
    grade VARCHAR(5) NOT NULL,
    remark VARCHAR(50) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (school_id, student_id, subject, term, session)
);

CREATE INDEX idx_result_class_term ON results(school_id, class_id, term, session);
";

const QUESTIONS_SQL: &str = r"
CREATE TABLE questions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    school_id UUID NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    subject VARCHAR(100) NOT NULL,
    class_level VARCHAR(20) NOT NULL,
    topic VARCHAR(100),
    kind question_kind NOT NULL,
    difficulty difficulty NOT NULL,
    body TEXT NOT NULL,
    options JSONB NOT NULL DEFAULT '[]',
    answer TEXT,
    marks INTEGER NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_question_marks CHECK (marks > 0)
);

CREATE INDEX idx_question_bank ON questions(school_id, subject, class_level, difficulty);
";

const EXAMS_SQL: &str = r"
CREATE TABLE exams (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    school_id UUID NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    subject VARCHAR(100) NOT NULL,
    class_level VARCHAR(20) NOT NULL,
    term term,
    session VARCHAR(9),
    duration_minutes INTEGER,
    seed BIGINT NOT NULL,
    total_marks INTEGER NOT NULL,
    question_count INTEGER NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE exam_questions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    school_id UUID NOT NULL REFERENCES schools(id) ON DELETE CASCADE,
    exam_id UUID NOT NULL REFERENCES exams(id) ON DELETE CASCADE,
    question_id UUID NOT NULL REFERENCES questions(id) ON DELETE RESTRICT,
    position INTEGER NOT NULL,
    options JSONB NOT NULL DEFAULT '[]',
    marks INTEGER NOT NULL,
    UNIQUE (exam_id, position)
);

CREATE INDEX idx_exam_school ON exams(school_id, created_at DESC);
CREATE INDEX idx_exam_question_question ON exam_questions(question_id);
";

const RLS_SQL: &str = r"
-- ============================================================
-- ROW-LEVEL SECURITY POLICIES
-- Application sets context inside each transaction:
--   SET LOCAL app.current_school_id = '<school-uuid>';
-- ============================================================

ALTER TABLE chart_of_accounts ENABLE ROW LEVEL SECURITY;
ALTER TABLE fiscal_years ENABLE ROW LEVEL SECURITY;
ALTER TABLE journal_entries ENABLE ROW LEVEL SECURITY;
ALTER TABLE ledger_entries ENABLE ROW LEVEL SECURITY;
ALTER TABLE account_balances ENABLE ROW LEVEL SECURITY;
ALTER TABLE teachers ENABLE ROW LEVEL SECURITY;
ALTER TABLE classes ENABLE ROW LEVEL SECURITY;
ALTER TABLE students ENABLE ROW LEVEL SECURITY;
ALTER TABLE results ENABLE ROW LEVEL SECURITY;
ALTER TABLE questions ENABLE ROW LEVEL SECURITY;
ALTER TABLE exams ENABLE ROW LEVEL SECURITY;
ALTER TABLE exam_questions ENABLE ROW LEVEL SECURITY;

CREATE POLICY tenant_isolation ON chart_of_accounts
    USING (school_id = current_setting('app.current_school_id', true)::UUID);

CREATE POLICY tenant_isolation ON fiscal_years
    USING (school_id = current_setting('app.current_school_id', true)::UUID);

CREATE POLICY tenant_isolation ON journal_entries
    USING (school_id = current_setting('app.current_school_id', true)::UUID);

CREATE POLICY tenant_isolation ON ledger_entries
    USING (school_id = current_setting('app.current_school_id', true)::UUID);

CREATE POLICY tenant_isolation ON account_balances
    USING (school_id = current_setting('app.current_school_id', true)::UUID);

CREATE POLICY tenant_isolation ON teachers
    USING (school_id = current_setting('app.current_school_id', true)::UUID);

CREATE POLICY tenant_isolation ON classes
    USING (school_id = current_setting('app.current_school_id', true)::UUID);

CREATE POLICY tenant_isolation ON students
    USING (school_id = current_setting('app.current_school_id', true)::UUID);

CREATE POLICY tenant_isolation ON results
    USING (school_id = current_setting('app.current_school_id', true)::UUID);

CREATE POLICY tenant_isolation ON questions
    USING (school_id = current_setting('app.current_school_id', true)::UUID);

CREATE POLICY tenant_isolation ON exams
    USING (school_id = current_setting('app.current_school_id', true)::UUID);

CREATE POLICY tenant_isolation ON exam_questions
    USING (school_id = current_setting('app.current_school_id', true)::UUID);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS exam_questions CASCADE;
DROP TABLE IF EXISTS exams CASCADE;
DROP TABLE IF EXISTS questions CASCADE;
DROP TABLE IF EXISTS results CASCADE;
DROP TABLE IF EXISTS students CASCADE;
DROP TABLE IF EXISTS classes CASCADE;
DROP TABLE IF EXISTS teachers CASCADE;
DROP TABLE IF EXISTS account_balances CASCADE;
DROP TABLE IF EXISTS ledger_entries CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS fiscal_years CASCADE;
DROP TABLE IF EXISTS chart_of_accounts CASCADE;
DROP TABLE IF EXISTS schools CASCADE;

DROP TYPE IF EXISTS difficulty;
DROP TYPE IF EXISTS question_kind;
DROP TYPE IF EXISTS term;
DROP TYPE IF EXISTS employment_type;
DROP TYPE IF EXISTS gender;
DROP TYPE IF EXISTS teacher_status;
DROP TYPE IF EXISTS journal_source;
DROP TYPE IF EXISTS account_type;
";
